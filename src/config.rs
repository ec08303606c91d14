use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const TIME_PER_TURN: Duration = Duration::from_secs(60);
pub const LOW_TIME_THRESHOLD: Duration = Duration::from_secs(10);
/// Half-moves without a capture or a man move before the game is drawn.
pub const NO_PROGRESS_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub time_per_turn: Duration,
    pub low_time_threshold: Duration,
    pub no_progress_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            time_per_turn: TIME_PER_TURN,
            low_time_threshold: LOW_TIME_THRESHOLD,
            no_progress_limit: NO_PROGRESS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub data_dir: PathBuf,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: PathBuf::from("static"),
            data_dir: PathBuf::from("data"),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `CHECKERS_BIND`, `CHECKERS_STATIC_DIR` and `CHECKERS_DATA_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ServerConfig::default();

        if let Some(addr) = lookup("CHECKERS_BIND") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(e) => warn!(%addr, error = %e, "ignoring unparsable CHECKERS_BIND"),
            }
        }
        if let Some(dir) = lookup("CHECKERS_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CHECKERS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }
}
