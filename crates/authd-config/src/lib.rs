//! The settings store (C1): loads, validates, and hot-reloads `authd.conf`
//! plus the per-client and per-resource-server config directories.

pub mod defaults;
pub mod error;
pub mod parse;
pub mod store;
pub mod validate;

pub use error::{ConfigError, ConfigErrorMap};
pub use store::{SettingsStore, StorePaths};
