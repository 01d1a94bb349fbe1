//! Daemon mode: the registry service behind a UNIX socket.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial module structure

pub mod marshal;
pub mod protocol;
pub mod server;
pub mod service;
