use std::env;
use std::path::PathBuf;

/// Runtime configuration.
///
/// Resolved from environment variables (a `.env` file is honored by the
/// binary); CLI flags override individual fields afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// Path of the SQLite state database.
    pub db_path: PathBuf,
    /// Shared secret expected in the `x-admin-password` header on writes.
    pub admin_password: String,
    /// Directory served under `/static` (with `index.html` at `/`).
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            db_path: PathBuf::from("mapsync.db"),
            admin_password: "change-me".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `BIND_ADDR`, `DB_PATH`, `ADMIN_PASSWORD`,
    /// `STATIC_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = env::var("DB_PATH") {
            config.db_path = path.into();
        }
        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            config.admin_password = password;
        }
        if let Ok(dir) = env::var("STATIC_DIR") {
            config.static_dir = dir.into();
        }
        config
    }
}
