//! Traits implemented by the migration shadow a model compiles when it
//! declares a `#[migration]` key enum.
//!
//! The runtime half lives in [`crate::migration`].

pub mod traits;

pub use traits::MigrationShadow;
