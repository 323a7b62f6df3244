//! # Docbase Store
//!
//! Single-record persisted models with compile-time generated accessors,
//! keyed serialization and key-schema migration.
//!
//! `#[persisted_model]` compiles a model description into:
//!
//! - **Accessors** that lazily load the record, notify an observation sink
//!   and write the whole record back on every persisted-field mutation
//! - **Keyed serialization** against a derived or user-supplied key enum
//! - **Migration** from an older key enum, as `migrate` / `should_migrate`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docbase_store::prelude::*;
//!
//! #[persisted_model]
//! pub mod settings {
//!     use docbase_store::prelude::*;
//!
//!     pub struct Settings {
//!         pub volume: u8,
//!         pub theme: String,
//!         #[persisted_ignored]
//!         pub unsaved: String,
//!     }
//!
//!     #[storage_name]
//!     pub const STORAGE: &str = "Preferences";
//! }
//!
//! let context = settings::Settings::context(&StorageConfig::new("/tmp/app"));
//! let mut prefs = settings::Settings::new(context.clone(), 7, "dark".into(), String::new())?;
//! prefs.set_volume(9)?;
//!
//! let reopened = settings::Settings::open(context);
//! assert_eq!(*reopened.volume()?, 9);
//! ```

extern crate self as docbase_store;

pub mod config;
pub mod container;
pub mod context;
pub mod databases;
pub mod error;
pub mod migration;
pub mod observation;
pub mod prelude;
pub mod slots;
pub mod traits;

pub use docbase_macros::{CodingKey, persisted_model};
