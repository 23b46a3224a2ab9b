//! Configuration types for GitCompass.
//!
//! This crate provides the configuration types used by GitCompass
//! for `.gitcompass/config.yaml` files.

pub mod types;
pub mod loader;

pub use types::*;
pub use loader::*;
