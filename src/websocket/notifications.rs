use crate::game::{Color, GameStatus, Move, Piece};
use crate::models::GameRecord;

pub fn joined(username: &str, color: Option<Color>) -> String {
    match color {
        Some(color) => format!("{} joined as {}", username, color),
        None => format!("{} is observing the game", username),
    }
}

pub fn moved(username: &str, mv: &Move, captured: Option<Piece>) -> String {
    let mut text = format!("{} moved from {} to {}", username, mv.from, mv.to);
    if let Some(piece) = captured {
        text.push_str(&format!(", capturing {}", piece));
    }
    if let Some(kind) = mv.promotion {
        text.push_str(&format!(" and promoted to {}", kind));
    }
    text
}

/// Announcement for the status the mover left the opponent in, if any.
pub fn status(record: &GameRecord, mover: &str, mover_color: Color) -> Option<String> {
    let opponent_color = mover_color.opponent();
    let opponent = record
        .seat(opponent_color)
        .map(str::to_owned)
        .unwrap_or_else(|| opponent_color.to_string());
    match record.game.status {
        GameStatus::Check => Some(format!("{} is in check.", opponent)),
        GameStatus::Checkmate => Some(format!(
            "{} is in checkmate. {} wins the game!",
            opponent, mover
        )),
        GameStatus::Stalemate => Some(format!(
            "{} is in stalemate. The game has ended in a draw!",
            opponent
        )),
        GameStatus::Normal | GameStatus::Resigned => None,
    }
}

pub fn resigned(username: &str) -> String {
    format!(
        "{} has resigned and forfeited the game. Game Over.",
        username
    )
}

pub fn left(username: &str) -> String {
    format!("{} left the game", username)
}
