//! Turns client commands into authoritative state changes and fans the
//! results out to every connection watching the same game.
//!
//! Everything that reads and then writes a game's record runs under that
//! game's lock, and the broadcasts for a transition are queued before the
//! lock is released. Registry membership has its own locking and is never
//! held across a game lock acquisition.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::notifications;
use super::registry::{ConnectionEntry, ConnectionId, Outbox, SessionRegistry};
use crate::dataaccess::{Authenticator, GameStore};
use crate::error::SessionError;
use crate::game::Move;
use crate::models::{CommandType, GameId, GameRecord, ServerMessage, UserGameCommand};

pub struct Synchronizer {
    auth: Arc<dyn Authenticator>,
    games: Arc<dyn GameStore>,
    registry: Arc<SessionRegistry>,
    game_locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

impl Synchronizer {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        games: Arc<dyn GameStore>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            auth,
            games,
            registry,
            game_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Runs one command and reports any refusal to `outbox` as an `ERROR`.
    pub fn dispatch(&self, conn: ConnectionId, outbox: Arc<dyn Outbox>, cmd: UserGameCommand) {
        debug!("Dispatching {:?} from {}", cmd.command_type, conn);
        let result = match cmd.command_type {
            CommandType::Connect => self.connect(conn, Arc::clone(&outbox), &cmd),
            CommandType::MakeMove => self.make_move(conn, &cmd),
            CommandType::Resign => self.resign(conn, &cmd),
            CommandType::Leave => self.leave(conn),
        };
        if let Err(e) = result {
            match &e {
                SessionError::Storage(_) => error!("{:?} from {} failed: {}", cmd.command_type, conn, e),
                _ => warn!("{:?} from {} rejected: {}", cmd.command_type, conn, e),
            }
            if let Err(delivery) = outbox.deliver(&ServerMessage::error(e.to_string()).to_json()) {
                warn!("Could not report error to {}: {}", conn, delivery);
            }
        }
    }

    /// Implicit leave for a closed socket. Silent when the connection never
    /// joined a game.
    pub fn disconnect(&self, conn: ConnectionId) {
        match self.leave(conn) {
            Ok(()) | Err(SessionError::NotConnected) => {}
            Err(e) => error!("Cleanup for {} failed: {}", conn, e),
        }
    }

    pub fn connect(
        &self,
        conn: ConnectionId,
        outbox: Arc<dyn Outbox>,
        cmd: &UserGameCommand,
    ) -> Result<(), SessionError> {
        let username = self.authenticate(&cmd.auth_token)?;
        // Locks are only ever created for games the store knows about.
        self.load(cmd.game_id)?;

        // Switching games is a leave of the old one. Done before taking the
        // new game's lock so two game locks are never held at once.
        if let Some(previous) = self.registry.get(&conn) {
            if previous.game_id != cmd.game_id {
                self.leave(conn)?;
            }
        }

        let lock = self.game_lock(cmd.game_id);
        let _guard = lock.lock();

        let record = self.load(cmd.game_id)?;
        let color = record.color_of(&username);

        self.registry.add(
            conn,
            ConnectionEntry {
                username: username.clone(),
                auth_token: cmd.auth_token.clone(),
                game_id: cmd.game_id,
                is_player: color.is_some(),
                outbox,
            },
        );
        info!(
            "{} connected to game {} as {}",
            username,
            cmd.game_id,
            color.map_or_else(|| "observer".to_string(), |c| c.to_string())
        );

        // The connection is registered, so a failed send here already
        // dropped it from the registry.
        let _ = self
            .registry
            .send_to(&conn, &ServerMessage::load_game(&record.game));
        self.registry.broadcast(
            cmd.game_id,
            Some(&conn),
            &ServerMessage::notification(notifications::joined(&username, color)),
        );
        Ok(())
    }

    pub fn make_move(&self, conn: ConnectionId, cmd: &UserGameCommand) -> Result<(), SessionError> {
        let entry = self.registry.get(&conn).ok_or(SessionError::NotConnected)?;
        self.authenticate(&cmd.auth_token)?;

        let lock = self.game_lock(entry.game_id);
        let _guard = lock.lock();

        let mut record = self.load(entry.game_id)?;
        if record.game.status.is_terminal() {
            return Err(SessionError::GameOver);
        }
        let color = record
            .color_of(&entry.username)
            .ok_or(SessionError::ObserverAction("make moves"))?;
        if record.game.turn != color {
            return Err(SessionError::NotYourTurn);
        }
        let mv: Move = cmd.chess_move.ok_or(SessionError::MissingMove)?;

        // Mutate a copy; the stored snapshot only changes once save succeeds.
        let captured = record.game.apply_move(mv)?;
        self.games.save_game(record.clone())?;
        info!(
            "Game {}: {} played {} -> {} ({:?})",
            entry.game_id, entry.username, mv.from, mv.to, record.game.status
        );

        self.registry.broadcast(
            entry.game_id,
            Some(&conn),
            &ServerMessage::notification(notifications::moved(&entry.username, &mv, captured)),
        );
        if let Some(text) = notifications::status(&record, &entry.username, color) {
            self.registry
                .broadcast(entry.game_id, None, &ServerMessage::notification(text));
        }
        self.registry
            .broadcast(entry.game_id, None, &ServerMessage::load_game(&record.game));
        Ok(())
    }

    pub fn resign(&self, conn: ConnectionId, cmd: &UserGameCommand) -> Result<(), SessionError> {
        let entry = self.registry.get(&conn).ok_or(SessionError::NotConnected)?;
        self.authenticate(&cmd.auth_token)?;

        let lock = self.game_lock(entry.game_id);
        let _guard = lock.lock();

        let mut record = self.load(entry.game_id)?;
        if record.color_of(&entry.username).is_none() {
            return Err(SessionError::ObserverAction("resign"));
        }
        if record.game.status.is_terminal() {
            return Err(SessionError::GameOver);
        }

        record.game.force_resign();
        self.games.save_game(record.clone())?;
        info!("Game {}: {} resigned", entry.game_id, entry.username);

        self.registry.broadcast(
            entry.game_id,
            None,
            &ServerMessage::notification(notifications::resigned(&entry.username)),
        );
        self.registry
            .broadcast(entry.game_id, None, &ServerMessage::load_game(&record.game));
        Ok(())
    }

    pub fn leave(&self, conn: ConnectionId) -> Result<(), SessionError> {
        let entry = self.registry.remove(&conn).ok_or(SessionError::NotConnected)?;

        let lock = self.game_lock(entry.game_id);
        let _guard = lock.lock();

        // Seats are read from the record, as in make_move: one may have been
        // claimed after this connection joined.
        let mut vacated = false;
        if let Some(record) = self.games.load_game(entry.game_id)? {
            if record.color_of(&entry.username).is_some() {
                self.games
                    .clear_player_slot(entry.game_id, &entry.username)?;
                vacated = true;
            }
        }
        info!(
            "{} left game {}{}",
            entry.username,
            entry.game_id,
            if vacated { ", seat vacated" } else { "" }
        );

        self.registry.broadcast(
            entry.game_id,
            None,
            &ServerMessage::notification(notifications::left(&entry.username)),
        );
        Ok(())
    }

    fn authenticate(&self, token: &str) -> Result<String, SessionError> {
        self.auth
            .resolve_token(token)?
            .ok_or(SessionError::Unauthenticated)
    }

    fn load(&self, game_id: GameId) -> Result<GameRecord, SessionError> {
        self.games
            .load_game(game_id)?
            .ok_or(SessionError::GameNotFound(game_id))
    }

    fn game_lock(&self, game_id: GameId) -> Arc<Mutex<()>> {
        Arc::clone(self.game_locks.lock().entry(game_id).or_default())
    }
}
