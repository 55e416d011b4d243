use actix::Message;
use serde::{Deserialize, Serialize};

use crate::game::{Game, Move};
use crate::models::GameId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Connect,
    Leave,
    MakeMove,
    Resign,
}

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserGameCommand {
    #[serde(rename = "commandType", alias = "verb")]
    pub command_type: CommandType,
    #[serde(rename = "authToken", alias = "token")]
    pub auth_token: String,
    #[serde(rename = "gameID", alias = "gameId")]
    pub game_id: GameId,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub chess_move: Option<Move>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "serverMessageType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    LoadGame {
        game: Game,
    },
    Notification {
        message: String,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl ServerMessage {
    pub fn load_game(game: &Game) -> Self {
        ServerMessage::LoadGame { game: game.clone() }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage::Notification {
            message: message.into(),
        }
    }

    /// Error text always reads as an error: `Error: ` is prepended unless
    /// the word is already there.
    pub fn error(message: impl Into<String>) -> Self {
        let mut error_message = message.into();
        if !error_message.to_lowercase().contains("error") {
            error_message = format!("Error: {}", error_message);
        }
        ServerMessage::Error { error_message }
    }

    pub fn to_json(&self) -> String {
        // Every variant is plain data with string keys.
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"serverMessageType\":\"ERROR\",\"errorMessage\":\"Error: {}\"}}",
                e
            )
        })
    }
}

/// Serialized server message queued for delivery on a WebSocket actor.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
