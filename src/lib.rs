//! handsome-registry library
//!
//! A local registry mapping file-name extensions to the programs registered
//! to open them, served over a UNIX socket, plus the client used to reach it.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial library structure

pub mod client;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod logging;

pub use client::{ClientError, DaemonClient};
pub use config::DaemonConfig;
pub use db::{Association, Store};
pub use error::{CallError, DecodeError, StoreError};
