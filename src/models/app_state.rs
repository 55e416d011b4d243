use std::sync::Arc;

use crate::dataaccess::MemoryDataAccess;
use crate::websocket::{Heartbeat, SessionRegistry, Synchronizer};

/// Application state shared between connections
pub struct AppState {
    pub store: Arc<MemoryDataAccess>,
    pub synchronizer: Synchronizer,
    pub heartbeat: Heartbeat,
}

impl AppState {
    /// Wires the synchronizer and the REST handlers to one shared store.
    pub fn new(store: Arc<MemoryDataAccess>, heartbeat: Heartbeat) -> Self {
        let synchronizer = Synchronizer::new(
            store.clone(),
            store.clone(),
            Arc::new(SessionRegistry::new()),
        );
        Self {
            store,
            synchronizer,
            heartbeat,
        }
    }

    pub fn in_memory(heartbeat: Heartbeat) -> Self {
        Self::new(Arc::new(MemoryDataAccess::new()), heartbeat)
    }
}
