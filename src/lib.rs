//! # Mapsync - Real-Time Shared Map State Server
//!
//! A tiny state-sync service: one shared map document (a version number
//! plus a list of vector objects) persisted in SQLite, readable by
//! anyone over HTTP, writable only with the admin password header, and
//! pushed to every connected WebSocket viewer on each accepted write.
//!
//! ## How it fits together
//!
//! - [`store`] — singleton document persistence (SQLite, async facade)
//! - [`document`] — the document model, version assignment, wire frames
//! - [`sync`] — connection registry and broadcast fan-out
//! - [`server`] — axum HTTP/WebSocket endpoints and admin auth
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapsync::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     server::start(config).await
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod server;
pub mod store;
pub mod sync;

// Re-export main types for library consumers
pub use config::Config;
pub use document::{Document, Frame, WriteRequest};
pub use error::{StoreError, SyncError};
pub use store::{Database, StateStore};
pub use sync::{ConnectionRegistry, SyncHub};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
