//! # pathkv
//!
//! A path-addressed key/value store with live change notification.
//!
//! Values are JSON documents stored at hierarchical paths (`/users/42`). Every
//! committed write or delete carries a per-path version stamp and is fanned
//! out to subscriptions whose patterns (`users/*`, `logs/**`) match the path.
//!
//! ## Components
//!
//! - [`Path`] / [`Pattern`] - path grammar and wildcard matching
//! - [`VersionedStore`] - per-path serialized writes and version stamps
//! - [`ChangeBus`] - subscription registry and per-subscriber mailboxes
//! - [`Database`] - a store wired to its bus, built from [`Settings`]
//!
//! ## Example
//!
//! ```
//! use pathkv::Database;
//! use serde_json::json;
//!
//! let db = Database::default();
//! let id = db.bus().subscribe(["users/*"]).unwrap();
//!
//! db.store().write("/users/42", json!({"name": "a"})).unwrap();
//! db.store().write("/orders/1", json!({"total": 3})).unwrap();
//!
//! let mut drain = db.bus().drain(id).unwrap();
//! let update = drain.try_next().unwrap();
//! assert_eq!(update.path.to_string(), "/users/42");
//! assert_eq!(update.version, 1);
//! assert!(drain.try_next().is_none());
//! ```

mod config;
mod constants;
mod database;
mod errors;
pub mod metrics;
mod path;
mod pattern;
mod store;
mod utils;
mod watch;

pub use config::*;
pub use database::*;
pub use errors::*;
pub use path::*;
pub use pattern::*;
pub use store::*;
pub use watch::*;
