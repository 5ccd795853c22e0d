//! The token handler (C2): builds, validates, and revokes opaque encrypted
//! tokens, including symmetric key rotation and the in-memory revocation
//! blacklist.

pub mod clock;
pub mod handler;
pub mod key;
pub mod payload;

pub use handler::{GenerateError, KeyRotationPolicy, TokenHandler};
pub use payload::{PayloadError, TokenData};
