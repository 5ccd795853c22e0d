//! The response helper (C4): renders the four named pages (password setup,
//! login, password change, confirmation) as HTML or, under content
//! negotiation, as compact JSON.

pub mod html_escape;
pub mod response_helper;
pub mod template;

pub use html_escape::escape;
pub use response_helper::{ErrorType, GlobalSettingsView, Rendered, ResponseHelper, CLOSE_TAB};
pub use template::Template;
