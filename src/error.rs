use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::dataaccess::DataAccessError;
use crate::game::InvalidMove;
use crate::models::GameId;

/// Why a WebSocket command was refused. Each variant is reported to the
/// requesting connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid authToken")]
    Unauthenticated,
    #[error("game {0} does not exist")]
    GameNotFound(GameId),
    #[error("not connected to a game")]
    NotConnected,
    #[error("only players can {0}")]
    ObserverAction(&'static str),
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),
    #[error("invalid move: no move supplied")]
    MissingMove,
    #[error("the game has ended")]
    GameOver,
    #[error("storage failure: {0}")]
    Storage(#[from] DataAccessError),
}

/// REST-facing error with an HTTP status.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ApiError(#[from] pub DataAccessError);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            DataAccessError::BadRequest => StatusCode::BAD_REQUEST,
            DataAccessError::Unauthorized => StatusCode::UNAUTHORIZED,
            DataAccessError::AlreadyTaken => StatusCode::FORBIDDEN,
            DataAccessError::GameNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(json!({ "message": format!("Error: {}", self.0) }))
    }
}
