//! Unix socket client for the registry daemon.
//!
//! Thin pass-through: each helper issues one call and unwraps the reply.
//! `run` is plain process spawning and never talks to the daemon.
//!
//! CHANGELOG:
//! - 10/19/2026 - Reject unusable timeouts instead of panicking
//! - 10/19/2026 - Initial implementation

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use crate::config;
use crate::daemon::marshal::{self, MarshalError};
use crate::daemon::protocol::{Request, Response};

/// Errors that can occur when communicating with the daemon.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Socket not found: {0}")]
    SocketNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializeError(#[source] serde_json::Error),

    #[error("JSON parse error: {0}")]
    ParseError(#[source] serde_json::Error),

    #[error("Empty response from daemon")]
    EmptyResponse,

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Invalid timeout {0}: must be a finite number of seconds above zero")]
    InvalidTimeout(f64),

    /// The daemon answered `ok: false`.
    #[error("{code}: {message}")]
    Remote {
        code: String,
        message: String,
        /// Legacy status payload, when the operation has one
        status: Option<i64>,
    },

    #[error("Unexpected result payload: {0}")]
    BadResult(String),

    #[error("Failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Stable error code for CLI output.
    pub fn code(&self) -> &str {
        match self {
            ClientError::SocketNotFound(_) => "DAEMON_NOT_RUNNING",
            ClientError::ConnectionFailed(_) => "CONNECT_FAILED",
            ClientError::SerializeError(_) => "SERIALIZE_ERROR",
            ClientError::ParseError(_) => "PARSE_ERROR",
            ClientError::EmptyResponse => "EMPTY_RESPONSE",
            ClientError::Timeout => "TIMEOUT",
            ClientError::InvalidTimeout(_) => "INVALID_TIMEOUT",
            ClientError::Remote { code, .. } => code.as_str(),
            ClientError::BadResult(_) => "BAD_RESULT",
            ClientError::SpawnFailed { .. } => "SPAWN_FAILED",
        }
    }

    /// Error as the JSON shape the CLI prints.
    pub fn to_json(&self) -> serde_json::Value {
        let status = match self {
            ClientError::Remote { status, .. } => *status,
            _ => None,
        };
        json!({
            "ok": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "status": status,
            }
        })
    }
}

impl From<MarshalError> for ClientError {
    fn from(e: MarshalError) -> Self {
        ClientError::BadResult(e.to_string())
    }
}

/// A client for the registry daemon.
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    /// Create a new client with the given socket path and timeout.
    pub fn new(socket_path: impl AsRef<Path>, timeout_secs: f64) -> Result<Self, ClientError> {
        Ok(Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            timeout: timeout_from_secs(timeout_secs)?,
        })
    }

    /// Create a client with the default (or `HANDSOME_SOCKET`) socket path.
    pub fn default_socket(timeout_secs: f64) -> Result<Self, ClientError> {
        Self::new(config::client_socket_path(None), timeout_secs)
    }

    /// Send a request to the daemon and receive a response.
    pub fn call(&self, request: &Request) -> Result<Response, ClientError> {
        let path = self.socket_path.as_path();

        if !path.exists() {
            return Err(ClientError::SocketNotFound(path.display().to_string()));
        }

        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut writer = &stream;
        let line = request.to_ndjson_line().map_err(ClientError::SerializeError)?;
        writer.write_all(line.as_bytes()).map_err(timeout_or_io)?;
        writer.flush()?;

        let mut reader = BufReader::new(&stream);
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).map_err(timeout_or_io)?;

        if bytes_read == 0 {
            return Err(ClientError::EmptyResponse);
        }

        Response::from_ndjson_line(&line).map_err(ClientError::ParseError)
    }

    /// Call and unwrap: `ok: false` becomes `ClientError::Remote`.
    pub fn call_ok(&self, request: &Request) -> Result<serde_json::Value, ClientError> {
        let response = self.call(request)?;
        if response.ok {
            return Ok(response.result.unwrap_or(serde_json::Value::Null));
        }

        let status = response.result.as_ref().and_then(serde_json::Value::as_i64);
        let (code, message) = response
            .error
            .map(|e| (e.code, e.message))
            .unwrap_or_else(|| ("ERROR".to_string(), "unknown error".to_string()));
        Err(ClientError::Remote {
            code,
            message,
            status,
        })
    }

    /// Register `program` for `extension`. Returns the daemon's status (0).
    pub fn add_program(&self, program: &str, extension: &str) -> Result<i64, ClientError> {
        let request = Request::new("Add", json!({ "path": program, "extension": extension }));
        status_of(self.call_ok(&request)?)
    }

    /// Remove every registration of `program`.
    pub fn delete_program(&self, program: &str) -> Result<i64, ClientError> {
        let request = Request::new("Delete", json!({ "path": program }));
        status_of(self.call_ok(&request)?)
    }

    /// Programs registered for the extension of `file_name`.
    pub fn select_program(&self, file_name: &str) -> Result<Vec<String>, ClientError> {
        let request = Request::new("Variants", json!({ "file_name": file_name }));
        Ok(marshal::decode_list(&self.call_ok(&request)?)?)
    }

    /// Daemon health check.
    pub fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.call_ok(&Request::new("Health", json!({})))
    }
}

fn status_of(value: serde_json::Value) -> Result<i64, ClientError> {
    value
        .as_i64()
        .ok_or_else(|| ClientError::BadResult(value.to_string()))
}

/// Socket timeout from seconds. Zero, negative, NaN and infinite are rejected:
/// the socket layer refuses a zero timeout and `Duration` cannot hold the rest.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, ClientError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(ClientError::InvalidTimeout(secs)),
    }
}

fn timeout_or_io(e: std::io::Error) -> ClientError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => ClientError::Timeout,
        _ => ClientError::ConnectionFailed(e),
    }
}

/// Spawn `program` with `file` as its only argument. Does not wait.
pub fn run(program: &str, file: &str) -> Result<Child, ClientError> {
    Command::new(program)
        .arg(file)
        .spawn()
        .map_err(|source| ClientError::SpawnFailed {
            program: program.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let client = DaemonClient::new(dir.path().join("nope.sock"), 1.0).unwrap();
        let err = client.select_program("a.txt").unwrap_err();
        assert!(matches!(err, ClientError::SocketNotFound(_)));
        assert_eq!(err.code(), "DAEMON_NOT_RUNNING");
    }

    #[test]
    fn test_remote_error_json_keeps_status() {
        let err = ClientError::Remote {
            code: "STORE_QUERY_FAILED".to_string(),
            message: "disk full".to_string(),
            status: Some(1),
        };
        let out = err.to_json();
        assert_eq!(out["error"]["code"], "STORE_QUERY_FAILED");
        assert_eq!(out["error"]["status"], 1);
    }

    #[test]
    fn test_unusable_timeouts_rejected() {
        for secs in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let err = DaemonClient::new("/tmp/daemon.sock", secs).err().unwrap();
            assert_eq!(err.code(), "INVALID_TIMEOUT");
        }
        assert_eq!(timeout_from_secs(0.25).unwrap(), Duration::from_millis(250));
    }

    /// Freshly written executables can briefly be busy while a concurrent
    /// test forks; retry `run` past ETXTBSY.
    fn run_retrying(program: &str, file: &str) -> Child {
        for _ in 0..50 {
            match run(program, file) {
                Err(ClientError::SpawnFailed { source, .. })
                    if source.raw_os_error() == Some(libc::ETXTBSY) =>
                {
                    std::thread::sleep(Duration::from_millis(20));
                }
                other => return other.unwrap(),
            }
        }
        panic!("{} stayed busy", program);
    }

    #[test]
    fn test_run_spawns_with_single_argument() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("check-args");
        // Exits 0 only for exactly one argument equal to "my file.txt".
        std::fs::write(
            &program,
            "#!/bin/sh\ntest \"$#\" -eq 1 && test \"$1\" = \"my file.txt\"\n",
        )
        .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let program = program.to_str().unwrap();

        let mut child = run_retrying(program, "my file.txt");
        assert!(child.wait().unwrap().success());

        let mut child = run_retrying(program, "other.txt");
        assert!(!child.wait().unwrap().success());
    }

    #[test]
    fn test_run_missing_program() {
        let err = run("/definitely/not/here", "file.txt").unwrap_err();
        assert_eq!(err.code(), "SPAWN_FAILED");
    }
}
