use actix::Recipient;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChessWebSocketMessage, GameId, ServerMessage};

/// Opaque handle naming one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection closed")]
    Closed,
}

/// Where serialized server messages for one connection go.
///
/// Delivery must never block: a peer that cannot take the message right now
/// reports an error instead.
pub trait Outbox: Send + Sync {
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError>;
}

impl Outbox for Recipient<ChessWebSocketMessage> {
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        if !self.connected() {
            return Err(DeliveryError::Closed);
        }
        self.do_send(ChessWebSocketMessage(payload.to_owned()));
        Ok(())
    }
}

#[derive(Clone)]
pub struct ConnectionEntry {
    pub username: String,
    pub auth_token: String,
    pub game_id: GameId,
    pub is_player: bool,
    pub outbox: Arc<dyn Outbox>,
}

impl fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("username", &self.username)
            .field("game_id", &self.game_id)
            .field("is_player", &self.is_player)
            .finish_non_exhaustive()
    }
}

/// Live connections keyed by [`ConnectionId`], with game-scoped fan-out.
#[derive(Default)]
pub struct SessionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id`, replacing any previous entry for it.
    pub fn add(&self, id: ConnectionId, entry: ConnectionEntry) {
        info!(
            "Registering connection {} as {} in game {}",
            id, entry.username, entry.game_id
        );
        self.connections.write().insert(id, entry);
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<ConnectionEntry> {
        let removed = self.connections.write().remove(id);
        if removed.is_some() {
            info!("Removed connection {}", id);
        }
        removed
    }

    pub fn get(&self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.connections.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    pub fn connections_in(&self, game_id: GameId) -> Vec<ConnectionId> {
        self.connections
            .read()
            .iter()
            .filter(|(_, e)| e.game_id == game_id)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Sends to one registered connection. A dead peer is dropped.
    pub fn send_to(&self, id: &ConnectionId, message: &ServerMessage) -> Result<(), DeliveryError> {
        let outbox = match self.connections.read().get(id) {
            Some(entry) => Arc::clone(&entry.outbox),
            None => return Err(DeliveryError::Closed),
        };
        let result = outbox.deliver(&message.to_json());
        if let Err(ref e) = result {
            warn!("Delivery to {} failed: {}", id, e);
            self.remove(id);
        }
        result
    }

    /// Sends to every connection in `game_id` except `exclude`. Failed
    /// recipients are removed and the rest still receive the message.
    /// Returns how many deliveries succeeded.
    pub fn broadcast(
        &self,
        game_id: GameId,
        exclude: Option<&ConnectionId>,
        message: &ServerMessage,
    ) -> usize {
        let recipients: Vec<(ConnectionId, Arc<dyn Outbox>)> = {
            let connections = self.connections.read();
            connections
                .iter()
                .filter(|(id, e)| e.game_id == game_id && Some(*id) != exclude)
                .map(|(id, e)| (*id, Arc::clone(&e.outbox)))
                .collect()
        };
        debug!(
            "Broadcasting to {} connection(s) in game {}",
            recipients.len(),
            game_id
        );

        let payload = message.to_json();
        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, outbox) in recipients {
            match outbox.deliver(&payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Delivery to {} failed: {}", id, e);
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.write();
            for id in dead {
                connections.remove(&id);
            }
        }
        delivered
    }
}
