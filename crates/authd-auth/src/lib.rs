//! The authenticator (C3): composes a password backend and a password-change
//! backend behind one narrow surface, and enforces scope-to-group
//! authorization on top of a successful login.

pub mod authenticator;
pub mod backend;
pub mod group;

pub use authenticator::Authenticator;
pub use backend::{FormData, GroupProvider, PasswordBackend, PasswordChangeBackend, PasswordChangeError};
