pub mod handler;
pub mod notifications;
pub mod registry;
pub mod synchronizer;

pub use handler::{ws_index, ChessWebSocket, Heartbeat};
pub use registry::{ConnectionEntry, ConnectionId, DeliveryError, Outbox, SessionRegistry};
pub use synchronizer::Synchronizer;
