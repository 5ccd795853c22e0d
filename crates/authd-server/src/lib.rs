//! The HTTP surface (C5-C8): wires the settings store, token handler,
//! authenticator, and response helper into the four OAuth endpoints.

pub mod error;
pub mod localhost;
pub mod routes;
pub mod serve;
pub mod state;
mod support;

pub use error::ApiError;
pub use serve::{serve_tcp, serve_unix};
pub use state::AppState;
