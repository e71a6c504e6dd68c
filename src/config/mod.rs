//! Configuration Module
//!
//! Provides the analysis backend endpoint and upload defaults loaded from TOML,
//! replacing hardcoded values with operator-tunable ones.
//!
//! ## Loading Order
//!
//! 1. `VIBDIAG_CONFIG` environment variable (path to TOML file)
//! 2. `vibdiag.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded [`AppConfig`] is passed explicitly; nothing here is global.

mod app_config;
pub mod defaults;

pub use app_config::*;
