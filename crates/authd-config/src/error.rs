use std::collections::HashMap;

use authd_core::GlobalSettingKey;
use thiserror::Error;

/// Per-key validation errors, keyed by the setting that failed. Returned to
/// callers of `set_global_config` so a UI can highlight exactly which field
/// was rejected and why.
pub type ConfigErrorMap = HashMap<GlobalSettingKey, String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Invalid(String),
    #[error("unknown client id: {0}")]
    UnknownClient(String),
}
