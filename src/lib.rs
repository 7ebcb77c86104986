//! # FunPass
//!
//! Back office for an amusement park ticketing counter, usable both as a
//! standalone binary and as a library.
//!
//! The accounting core is the [`store::Store`] trait over a single SQLite
//! file: a per-employee allocation ledger, an append-only sales ledger, a
//! cancellation ledger with a Pending/Approved/Rejected workflow, and a
//! mutable pricing table. The HTTP layer exposes two role-scoped surfaces
//! (admin and counter employee) on top of it.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! funpass = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use funpass::notify::{LogNotifier, PriceFeed};
//! use funpass::server::{AppState, create_router};
//! use funpass::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/funpass.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     notifier: Arc::new(LogNotifier),
//!     price_feed: PriceFeed::default(),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI entry point. Disable with
//!   `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod server;
pub mod store;
pub mod tickets;
pub mod types;
