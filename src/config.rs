//! Daemon configuration: socket and database locations.
//!
//! Values resolve flag first, then environment, then the defaults under
//! `~/.handsome/`.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use std::path::{Path, PathBuf};

/// Well-known service name the socket stands in for.
pub const SERVICE_NAME: &str = "net.handsome.Daemon";
/// Object path of the single exported object.
pub const OBJECT_PATH: &str = "/net/handsome/Daemon";
/// Interface exposed by that object.
pub const INTERFACE_NAME: &str = "net.handsome.Daemon";

pub const SOCKET_ENV: &str = "HANDSOME_SOCKET";
pub const DB_ENV: &str = "HANDSOME_DB";

const STATE_DIR: &str = ".handsome";
const SOCKET_FILE: &str = "daemon.sock";
const DB_FILE: &str = "extensions.db";

/// Resolved daemon locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    pub db_path: PathBuf,
}

impl DaemonConfig {
    /// Resolve from optional CLI flags, falling back to env vars and defaults.
    pub fn resolve(socket: Option<&str>, db: Option<&str>) -> Self {
        Self {
            socket_path: resolve_path(socket, SOCKET_ENV, default_socket_path),
            db_path: resolve_path(db, DB_ENV, default_db_path),
        }
    }

    /// Config with explicit locations (tests, embedding).
    pub fn with_paths(socket_path: impl AsRef<Path>, db_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// PID file written next to the socket when daemonized.
    pub fn pid_path(&self) -> PathBuf {
        let mut pid = self.socket_path.clone().into_os_string();
        pid.push(".pid");
        PathBuf::from(pid)
    }

    /// Log file receiving stderr when daemonized.
    pub fn log_path(&self) -> PathBuf {
        let mut log = self.socket_path.clone().into_os_string();
        log.push(".log");
        PathBuf::from(log)
    }
}

fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR)
}

/// Default socket path (`~/.handsome/daemon.sock`).
pub fn default_socket_path() -> PathBuf {
    state_dir().join(SOCKET_FILE)
}

/// Default database path (`~/.handsome/extensions.db`).
pub fn default_db_path() -> PathBuf {
    state_dir().join(DB_FILE)
}

/// Socket path for clients: env override or default.
pub fn client_socket_path(flag: Option<&str>) -> PathBuf {
    resolve_path(flag, SOCKET_ENV, default_socket_path)
}

fn resolve_path(flag: Option<&str>, env_key: &str, default: fn() -> PathBuf) -> PathBuf {
    let from_env = std::env::var(env_key).ok().filter(|v| !v.trim().is_empty());
    match flag.map(str::to_string).or(from_env) {
        Some(raw) => expand(&raw),
        None => default(),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert!(default_socket_path().ends_with(".handsome/daemon.sock"));
        assert!(default_db_path().ends_with(".handsome/extensions.db"));
    }

    #[test]
    fn test_flag_wins() {
        let config = DaemonConfig::resolve(Some("/tmp/x.sock"), Some("/tmp/x.db"));
        assert_eq!(config.socket_path, PathBuf::from("/tmp/x.sock"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_tilde_expansion() {
        let path = expand("~/registry.db");
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("registry.db"));
    }

    #[test]
    fn test_pid_path() {
        let config = DaemonConfig::with_paths("/run/h/daemon.sock", "/tmp/e.db");
        assert_eq!(config.pid_path(), PathBuf::from("/run/h/daemon.sock.pid"));
        assert_eq!(config.log_path(), PathBuf::from("/run/h/daemon.sock.log"));
    }
}
