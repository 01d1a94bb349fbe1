//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket, accepts connections one at a time, and answers
//! each NDJSON request line through `RegistryService` before reading the
//! next. A bad line or failed call is answered and logged; the loop keeps
//! going. Every connection is bounded by `ConnectionLimits` so one client
//! cannot hold the loop.
//!
//! CHANGELOG:
//! - 10/19/2026 - Connection limits, byte-level line reading
//! - 10/19/2026 - Initial implementation

use anyhow::{bail, Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{DaemonConfig, SERVICE_NAME};
use crate::daemon::protocol::{self, Request, Response};
use crate::daemon::service::{Method, RegistryService};
use crate::error::{CallError, DecodeError};

/// A connected client that stays silent this long is dropped.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// A reply that cannot be written within this long drops the connection.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Hard cap on how long one connection may hold the loop.
pub const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(60);
/// Requests answered on one connection before it is closed.
pub const MAX_REQUESTS_PER_CONNECTION: usize = 1024;
/// Longest accepted request line, newline included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Bounds applied to every accepted connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub max_lifetime: Duration,
    pub max_requests: usize,
    pub max_line_bytes: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            idle_timeout: IDLE_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
            max_lifetime: MAX_CONNECTION_LIFETIME,
            max_requests: MAX_REQUESTS_PER_CONNECTION,
            max_line_bytes: MAX_LINE_BYTES,
        }
    }
}

/// Result of reading one request line.
enum LineRead {
    Line(Vec<u8>),
    Eof,
    Expired,
    TooLong,
}

/// Daemon server listening on UNIX socket.
pub struct DaemonServer {
    service: RegistryService,
    socket_path: PathBuf,
    limits: ConnectionLimits,
}

impl DaemonServer {
    /// Create new daemon server.
    pub fn new(config: &DaemonConfig) -> Self {
        Self::with_limits(config, ConnectionLimits::default())
    }

    /// Create a daemon server with explicit per-connection bounds.
    pub fn with_limits(config: &DaemonConfig, limits: ConnectionLimits) -> Self {
        Self {
            service: RegistryService::new(&config.db_path),
            socket_path: config.socket_path.clone(),
            limits,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing any stale file, with owner-only permissions.
    pub fn listen(&self) -> Result<UnixListener> {
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind {}", self.socket_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        // The store is created up front so a bad db path shows in the log early.
        if let Err(e) = self.service.store().ensure_schema() {
            warn!(error = %e, "store not ready; calls will report it");
        }

        info!(
            service = SERVICE_NAME,
            socket = %self.socket_path.display(),
            db = %self.service.store().db_path().display(),
            "listening"
        );
        Ok(listener)
    }

    /// Start serving requests (blocking).
    pub fn serve(&self) -> Result<()> {
        let listener = self.listen()?;
        self.serve_listener(listener)
    }

    /// Accept connections sequentially (single-threaded) until the listener fails.
    pub fn serve_listener(&self, listener: UnixListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        warn!(error = %e, "connection error");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "accept error");
                }
            }
        }

        Ok(())
    }

    /// Answer request lines on one connection until EOF or a limit is hit.
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let deadline = Instant::now() + self.limits.max_lifetime;
        stream.set_write_timeout(Some(self.limits.write_timeout))?;
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(&stream);
        let mut answered = 0usize;

        while answered < self.limits.max_requests {
            let response = match self.read_line(&mut reader, deadline)? {
                LineRead::Line(bytes) => match String::from_utf8(bytes) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => self.handle_line(&line),
                    Err(e) => {
                        let id = protocol::salvage_id(&String::from_utf8_lossy(e.as_bytes()));
                        let err = DecodeError::InvalidEncoding(e.utf8_error());
                        warn!(error = %err, "rejected request");
                        Response::error(id, err.code(), err.to_string(), 0.0)
                    }
                },
                LineRead::Eof => return Ok(()),
                LineRead::Expired => bail!("connection exceeded its lifetime"),
                LineRead::TooLong => {
                    let err = DecodeError::LineTooLong(self.limits.max_line_bytes);
                    let response = Response::error(String::new(), err.code(), err.to_string(), 0.0);
                    writer.write_all(response.to_ndjson_line()?.as_bytes())?;
                    bail!(err);
                }
            };

            let response_line = response.to_ndjson_line()?;
            writer.write_all(response_line.as_bytes())?;
            writer.flush()?;
            answered += 1;
        }

        debug!(answered, "request cap reached; closing connection");
        Ok(())
    }

    /// Read up to and including the next `\n`, checking the connection
    /// deadline between socket reads so a trickling client cannot stretch it.
    fn read_line(
        &self,
        reader: &mut BufReader<&UnixStream>,
        deadline: Instant,
    ) -> Result<LineRead> {
        let mut line = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(LineRead::Expired);
            }
            reader
                .get_ref()
                .set_read_timeout(Some(remaining.min(self.limits.idle_timeout)))?;

            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(if line.is_empty() {
                    LineRead::Eof
                } else {
                    LineRead::Line(line)
                });
            }

            let (taken, done) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            line.extend_from_slice(&available[..taken]);
            reader.consume(taken);

            if line.len() > self.limits.max_line_bytes {
                return Ok(LineRead::TooLong);
            }
            if done {
                return Ok(LineRead::Line(line));
            }
        }
    }

    /// Decode, dispatch and encode a single request line.
    pub fn handle_line(&self, line: &str) -> Response {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

        let request = match Request::from_ndjson_line(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "rejected request");
                return Response::error(
                    protocol::salvage_id(line),
                    e.code(),
                    e.to_string(),
                    elapsed_ms(),
                );
            }
        };

        let method = match request.method.parse::<Method>() {
            Ok(method) => method,
            Err(e) => {
                warn!(method = %request.method, "unknown method");
                return Response::error(request.id, e.code(), e.to_string(), elapsed_ms());
            }
        };

        let response = match self.service.dispatch(method, request.params) {
            Ok(result) => Response::success(request.id, result, elapsed_ms()),
            Err(e) => {
                // Store failures on Add/Delete still carry the in-band status.
                let status = match &e {
                    CallError::Store(_) => method.failure_status().map(serde_json::Value::from),
                    CallError::Decode(_) => None,
                };
                Response::failure(request.id, e.code(), e.to_string(), status, elapsed_ms())
            }
        };

        debug!(
            method = method.name(),
            ok = response.ok,
            server_ms = response.meta.server_ms,
            "handled call"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> (tempfile::TempDir, DaemonServer) {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::with_paths(
            dir.path().join("daemon.sock"),
            dir.path().join("extensions.db"),
        );
        (dir, DaemonServer::new(&config))
    }

    fn line(method: &str, params: serde_json::Value) -> String {
        Request::new(method, params).to_ndjson_line().unwrap()
    }

    #[test]
    fn test_garbage_line_gets_error_response() {
        let (_dir, server) = server();
        let resp = server.handle_line("{not json");
        assert!(!resp.ok);
        assert_eq!(resp.error.unwrap().code, "INVALID_JSON");
        assert_eq!(resp.id, "");
    }

    #[test]
    fn test_unknown_method_keeps_id() {
        let (_dir, server) = server();
        let req = Request::new("Frobnicate", json!({}));
        let resp = server.handle_line(&req.to_ndjson_line().unwrap());
        assert_eq!(resp.id, req.id);
        assert_eq!(resp.error.unwrap().code, "UNKNOWN_METHOD");
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_add_success_status() {
        let (_dir, server) = server();
        let resp = server.handle_line(&line("Add", json!({"path": "/bin/a", "extension": "txt"})));
        assert!(resp.ok);
        assert_eq!(resp.result, Some(json!(0)));
    }

    #[test]
    fn test_decode_failure_has_no_status() {
        let (_dir, server) = server();
        let resp = server.handle_line(&line("Add", json!({"extension": "txt"})));
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, "INVALID_PARAMS");
    }

    #[test]
    fn test_store_failure_carries_status_one() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::with_paths(
            dir.path().join("daemon.sock"),
            dir.path().join("missing").join("extensions.db"),
        );
        let server = DaemonServer::new(&config);

        let resp = server.handle_line(&line("Delete", json!({"path": "/bin/a"})));
        assert!(!resp.ok);
        assert_eq!(resp.result, Some(json!(1)));
        assert_eq!(resp.error.unwrap().code, "STORE_CONNECTION_FAILED");

        let resp = server.handle_line(&line("Variants", json!({"file_name": "a.txt"})));
        assert!(!resp.ok);
        assert!(resp.result.is_none());
    }
}
