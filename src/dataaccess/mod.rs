//! Collaborators the server core depends on: token resolution, game
//! persistence and the account store behind the REST surface.

mod memory;

pub use memory::MemoryDataAccess;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::Color;
use crate::models::{GameId, GameRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataAccessError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("already taken")]
    AlreadyTaken,
    #[error("bad request")]
    BadRequest,
    #[error("game {0} not found")]
    GameNotFound(GameId),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub username: String,
    pub auth_token: String,
}

pub trait Authenticator: Send + Sync {
    /// Username owning `token`, or `None` when the token names no session.
    fn resolve_token(&self, token: &str) -> Result<Option<String>, DataAccessError>;
}

pub trait GameStore: Send + Sync {
    fn load_game(&self, id: GameId) -> Result<Option<GameRecord>, DataAccessError>;

    /// Replaces the stored record with the same id.
    fn save_game(&self, record: GameRecord) -> Result<(), DataAccessError>;

    /// Vacates every seat `username` holds in game `id`.
    fn clear_player_slot(&self, id: GameId, username: &str) -> Result<(), DataAccessError>;

    fn create_game(&self, name: &str) -> Result<GameId, DataAccessError>;

    fn list_games(&self) -> Result<Vec<GameRecord>, DataAccessError>;

    /// Seats `username` as `color`; fails with `AlreadyTaken` if occupied.
    fn claim_seat(&self, id: GameId, color: Color, username: &str) -> Result<(), DataAccessError>;
}

pub trait UserStore: Send + Sync {
    fn register(&self, username: &str, password: &str) -> Result<AuthData, DataAccessError>;

    fn login(&self, username: &str, password: &str) -> Result<AuthData, DataAccessError>;

    fn logout(&self, token: &str) -> Result<(), DataAccessError>;
}
