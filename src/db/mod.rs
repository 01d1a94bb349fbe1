//! SQLite persistence for program/extension associations.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial module structure

pub mod connection;
pub mod helpers;
pub mod queries;
pub mod store;

pub use helpers::Association;
pub use store::Store;
