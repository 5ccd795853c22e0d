//! Core types shared by every authd component: the data model (§3 of the
//! design), OAuth error vocabulary, and wire-level string constants. This
//! crate has no I/O of its own; it exists so `authd-config`, `authd-token`,
//! `authd-auth`, `authd-templates`, `authd-params` and `authd-server` agree
//! on one vocabulary without depending on each other.

pub mod definitions;
pub mod model;
pub mod oauth_error;
pub mod settings;

pub use model::{AuthResult, OAuthClient, ResourceServer, TokenType, ValidationResult};
pub use oauth_error::OAuthError;
pub use settings::GlobalSettingKey;
