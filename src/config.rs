use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::websocket::Heartbeat;

/// Server settings; every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess_sync_server", version, about = "Real-time two-player chess server")]
pub struct Config {
    /// Address the HTTP and WebSocket server listens on
    #[arg(long, env = "CHESS_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Directory served under /static, skipped when missing
    #[arg(long, env = "CHESS_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Default log filter; RUST_LOG takes precedence
    #[arg(long, env = "CHESS_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CHESS_HEARTBEAT_SECS", default_value_t = 5)]
    pub heartbeat_secs: u64,

    #[arg(long, env = "CHESS_CLIENT_TIMEOUT_SECS", default_value_t = 30)]
    pub client_timeout_secs: u64,
}

impl Config {
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            interval: Duration::from_secs(self.heartbeat_secs.max(1)),
            timeout: Duration::from_secs(
                self.client_timeout_secs
                    .max(self.heartbeat_secs.saturating_add(1)),
            ),
        }
    }
}
