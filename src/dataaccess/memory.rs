use log::{debug, info};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use super::{AuthData, Authenticator, DataAccessError, GameStore, UserStore};
use crate::game::Color;
use crate::models::{GameId, GameRecord};

struct UserData {
    salt: String,
    password_hash: String,
}

/// Process-local implementation of every collaborator trait.
pub struct MemoryDataAccess {
    users: RwLock<HashMap<String, UserData>>,
    auths: RwLock<HashMap<String, String>>,
    games: RwLock<HashMap<GameId, GameRecord>>,
    next_game_id: AtomicU32,
}

impl Default for MemoryDataAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDataAccess {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            auths: RwLock::new(HashMap::new()),
            games: RwLock::new(HashMap::new()),
            next_game_id: AtomicU32::new(1),
        }
    }

    fn issue_token(&self, username: &str) -> AuthData {
        let auth_token = Uuid::new_v4().to_string();
        self.auths
            .write()
            .insert(auth_token.clone(), username.to_owned());
        AuthData {
            username: username.to_owned(),
            auth_token,
        }
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Authenticator for MemoryDataAccess {
    fn resolve_token(&self, token: &str) -> Result<Option<String>, DataAccessError> {
        Ok(self.auths.read().get(token).cloned())
    }
}

impl GameStore for MemoryDataAccess {
    fn load_game(&self, id: GameId) -> Result<Option<GameRecord>, DataAccessError> {
        Ok(self.games.read().get(&id).cloned())
    }

    fn save_game(&self, record: GameRecord) -> Result<(), DataAccessError> {
        debug!("Saving game {} ({:?})", record.game_id, record.game.status);
        self.games.write().insert(record.game_id, record);
        Ok(())
    }

    fn clear_player_slot(&self, id: GameId, username: &str) -> Result<(), DataAccessError> {
        let mut games = self.games.write();
        let record = games.get_mut(&id).ok_or(DataAccessError::GameNotFound(id))?;
        for color in [Color::White, Color::Black] {
            let seat = record.seat_mut(color);
            if seat.as_deref() == Some(username) {
                info!("Vacating {} seat of game {} held by {}", color, id, username);
                *seat = None;
            }
        }
        Ok(())
    }

    fn create_game(&self, name: &str) -> Result<GameId, DataAccessError> {
        if name.trim().is_empty() {
            return Err(DataAccessError::BadRequest);
        }
        let id = self.next_game_id.fetch_add(1, Ordering::SeqCst);
        self.games.write().insert(id, GameRecord::new(id, name));
        info!("Created game {} ({})", id, name);
        Ok(id)
    }

    fn list_games(&self) -> Result<Vec<GameRecord>, DataAccessError> {
        let mut games: Vec<GameRecord> = self.games.read().values().cloned().collect();
        games.sort_by_key(|g| g.game_id);
        Ok(games)
    }

    fn claim_seat(&self, id: GameId, color: Color, username: &str) -> Result<(), DataAccessError> {
        let mut games = self.games.write();
        let record = games.get_mut(&id).ok_or(DataAccessError::GameNotFound(id))?;
        let seat = record.seat_mut(color);
        if seat.is_some() {
            return Err(DataAccessError::AlreadyTaken);
        }
        *seat = Some(username.to_owned());
        info!("{} took the {} seat of game {}", username, color, id);
        Ok(())
    }
}

impl UserStore for MemoryDataAccess {
    fn register(&self, username: &str, password: &str) -> Result<AuthData, DataAccessError> {
        if username.is_empty() || password.is_empty() {
            return Err(DataAccessError::BadRequest);
        }
        {
            let mut users = self.users.write();
            if users.contains_key(username) {
                return Err(DataAccessError::AlreadyTaken);
            }
            let salt = Uuid::new_v4().to_string();
            let password_hash = hash_password(&salt, password);
            users.insert(
                username.to_owned(),
                UserData {
                    salt,
                    password_hash,
                },
            );
        }
        info!("Registered user {}", username);
        Ok(self.issue_token(username))
    }

    fn login(&self, username: &str, password: &str) -> Result<AuthData, DataAccessError> {
        if username.is_empty() || password.is_empty() {
            return Err(DataAccessError::BadRequest);
        }
        let matches = self
            .users
            .read()
            .get(username)
            .is_some_and(|u| u.password_hash == hash_password(&u.salt, password));
        if !matches {
            return Err(DataAccessError::Unauthorized);
        }
        Ok(self.issue_token(username))
    }

    fn logout(&self, token: &str) -> Result<(), DataAccessError> {
        self.auths
            .write()
            .remove(token)
            .map(|_| ())
            .ok_or(DataAccessError::Unauthorized)
    }
}
