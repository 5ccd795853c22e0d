use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use serde_json::json;
use tracing::warn;

use crate::html_escape::escape;
use crate::template::Template;

/// The sentinel cancel/continue URI meaning "close the tab" rather than
/// redirect anywhere, used by the standalone password-change flow.
pub const CLOSE_TAB: &str = "";

const SYSTEM_USE_NOTIFICATION_FILE: &str = "/etc/system-use-notification";
const SYSTEM_USE_NOTIFICATION_MAX: usize = 1024 * 1024;

/// Stable error codes mirrored in the JSON rendering, matching the four
/// values the original response helper distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    NoError,
    InternalError,
    InvalidRequest,
    InvalidUsernameOrPassword,
    InvalidNewPassword,
}

impl ErrorType {
    fn code(self) -> &'static str {
        match self {
            ErrorType::NoError => "",
            ErrorType::InternalError => "internal_error",
            ErrorType::InvalidRequest => "invalid_request",
            ErrorType::InvalidUsernameOrPassword => "invalid_username_or_password",
            ErrorType::InvalidNewPassword => "invalid_new_password",
        }
    }

    fn message(self) -> &'static str {
        match self {
            ErrorType::NoError => "",
            ErrorType::InternalError => "Internal server error.",
            ErrorType::InvalidRequest => "Invalid request.",
            ErrorType::InvalidUsernameOrPassword => "Invalid username or password.",
            ErrorType::InvalidNewPassword => "Invalid new password.",
        }
    }
}

/// What the response helper needs from the settings store. Kept narrow so
/// this crate never depends on `authd-config`.
pub trait GlobalSettingsView: Send + Sync {
    fn system_use_notification(&self) -> String;
    fn silent_mode_enabled(&self) -> bool;
}

#[derive(Debug, Clone)]
pub enum Rendered {
    Html(String),
    Json(serde_json::Value),
}

pub struct ResponseHelper {
    login: Template,
    password_setup: Template,
    password_change: Template,
    confirmation: Template,
    hostname: String,
    service_name: &'static str,
    service_version: &'static str,
    api_version: &'static str,
    favicon_href: &'static str,
    settings: Box<dyn GlobalSettingsView>,
}

impl ResponseHelper {
    pub fn new(hostname: String, settings: Box<dyn GlobalSettingsView>) -> Self {
        Self {
            login: Template::parse(include_str!("templates/login.html")),
            password_setup: Template::parse(include_str!("templates/password_setup.html")),
            password_change: Template::parse(include_str!("templates/password_change.html")),
            confirmation: Template::parse(include_str!("templates/confirmation.html")),
            hostname,
            service_name: "authd",
            service_version: env!("CARGO_PKG_VERSION"),
            api_version: "v1",
            favicon_href: "/favicon.ico",
            settings,
        }
    }

    fn common_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("HOSTNAME", self.hostname.clone());
        vars.insert("SERVICE_NAME", self.service_name.to_string());
        vars.insert("SERVICE_VERSION", self.service_version.to_string());
        vars.insert("API_VERSION", self.api_version.to_string());
        vars.insert("FAVICON_HREF", self.favicon_href.to_string());
        vars.insert(
            "SILENT_MODE_CLASS",
            if self.settings.silent_mode_enabled() {
                "silent".to_string()
            } else {
                String::new()
            },
        );
        vars.insert(
            "SYSTEM_USE_NOTIFICATION",
            escape(&self.resolve_system_use_notification()),
        );
        vars
    }

    fn resolve_system_use_notification(&self) -> String {
        let configured = self.settings.system_use_notification();
        if !configured.is_empty() {
            return configured;
        }
        match read_capped(
            &PathBuf::from(SYSTEM_USE_NOTIFICATION_FILE),
            SYSTEM_USE_NOTIFICATION_MAX,
        ) {
            Ok(contents) => contents.trim().to_string(),
            Err(err) => {
                warn!(error = %err, "failed to read system use notification file");
                "Failed to load system use notification".to_string()
            }
        }
    }

    fn json_confirmation(success: bool, error_type: ErrorType) -> Rendered {
        let mut body = json!({ "success": success });
        if error_type != ErrorType::NoError {
            body["error"] = json!(error_type.code());
            body["error_description"] = json!(error_type.message());
        }
        Rendered::Json(body)
    }

    pub fn send_password_setup_page(
        &self,
        accepts_json: bool,
        cancel_uri: &str,
        error_type: ErrorType,
        additional_error_message: &str,
    ) -> Rendered {
        if accepts_json {
            return Self::json_confirmation(error_type == ErrorType::NoError, error_type);
        }
        let mut vars = self.common_vars();
        vars.insert("PAGE_TITLE", "Set administrator password".to_string());
        vars.insert("CANCEL_URI", cancel_uri.to_string());
        vars.insert(
            "ERROR_MESSAGE",
            escape(&error_message(error_type, additional_error_message)),
        );
        Rendered::Html(self.password_setup.render(&vars))
    }

    pub fn send_login_page(
        &self,
        accepts_json: bool,
        cancel_uri: &str,
        accessing_client_label: &str,
        error_type: ErrorType,
        additional_error_message: &str,
        success_message: &str,
    ) -> Rendered {
        if accepts_json {
            return Self::json_confirmation(error_type == ErrorType::NoError, error_type);
        }
        let mut vars = self.common_vars();
        vars.insert("PAGE_TITLE", "Sign in".to_string());
        vars.insert("CANCEL_URI", cancel_uri.to_string());
        vars.insert("CLIENT_NAME", escape(accessing_client_label));
        vars.insert(
            "ERROR_MESSAGE",
            escape(&error_message(error_type, additional_error_message)),
        );
        vars.insert("SUCCESS_MESSAGE", escape(success_message));
        Rendered::Html(self.login.render(&vars))
    }

    pub fn send_password_change_page(
        &self,
        accepts_json: bool,
        cancel_uri: &str,
        user_name: &str,
        error_type: ErrorType,
        additional_error_message: &str,
        info_message: &str,
    ) -> Rendered {
        if accepts_json {
            return Self::json_confirmation(error_type == ErrorType::NoError, error_type);
        }
        let mut vars = self.common_vars();
        vars.insert("PAGE_TITLE", "Change password".to_string());
        vars.insert("CANCEL_URI", cancel_uri.to_string());
        vars.insert("USER_NAME", escape(user_name));
        vars.insert(
            "ERROR_MESSAGE",
            escape(&error_message(error_type, additional_error_message)),
        );
        vars.insert("INFO_MESSAGE", escape(info_message));
        Rendered::Html(self.password_change.render(&vars))
    }

    pub fn send_success_confirmation(
        &self,
        accepts_json: bool,
        continue_uri: &str,
        success_message: &str,
    ) -> Rendered {
        if accepts_json {
            return Self::json_confirmation(true, ErrorType::NoError);
        }
        let mut vars = self.common_vars();
        vars.insert("PAGE_TITLE", "Success".to_string());
        vars.insert("CONTINUE_URI", continue_uri.to_string());
        vars.insert("SUCCESS_MESSAGE", escape(success_message));
        Rendered::Html(self.confirmation.render(&vars))
    }

    pub fn send_error_confirmation(
        &self,
        accepts_json: bool,
        continue_uri: &str,
        error_type: ErrorType,
        additional_error_message: &str,
    ) -> Rendered {
        if accepts_json {
            return Self::json_confirmation(false, error_type);
        }
        let mut vars = self.common_vars();
        vars.insert("PAGE_TITLE", "Error".to_string());
        vars.insert("CONTINUE_URI", continue_uri.to_string());
        vars.insert(
            "ERROR_MESSAGE",
            escape(&error_message(error_type, additional_error_message)),
        );
        Rendered::Html(self.confirmation.render(&vars))
    }
}

/// Reads at most `max_bytes` from `path`, never pulling an oversized file
/// wholesale into memory first. A truncation that lands mid-codepoint is
/// repaired lossily rather than treated as a read failure.
fn read_capped(path: &PathBuf, max_bytes: usize) -> io::Result<String> {
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    File::open(path)?.take(max_bytes as u64).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn error_message(error_type: ErrorType, additional_error_message: &str) -> String {
    if !additional_error_message.is_empty() {
        additional_error_message.to_string()
    } else {
        error_type.message().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSettings {
        notification: String,
        silent_mode: bool,
    }

    impl GlobalSettingsView for FixedSettings {
        fn system_use_notification(&self) -> String {
            self.notification.clone()
        }
        fn silent_mode_enabled(&self) -> bool {
            self.silent_mode
        }
    }

    fn helper() -> ResponseHelper {
        ResponseHelper::new(
            "device1".to_string(),
            Box::new(FixedSettings {
                notification: "Authorized use only.".to_string(),
                silent_mode: false,
            }),
        )
    }

    #[test]
    fn json_negotiation_returns_compact_document() {
        let rendered = helper().send_login_page(true, "/cancel", "client", ErrorType::NoError, "", "");
        match rendered {
            Rendered::Json(value) => assert_eq!(value["success"], true),
            Rendered::Html(_) => panic!("expected json"),
        }
    }

    #[test]
    fn json_error_includes_code_and_description() {
        let rendered = helper().send_login_page(
            true,
            "/cancel",
            "client",
            ErrorType::InvalidUsernameOrPassword,
            "",
            "",
        );
        match rendered {
            Rendered::Json(value) => {
                assert_eq!(value["success"], false);
                assert_eq!(value["error"], "invalid_username_or_password");
            }
            Rendered::Html(_) => panic!("expected json"),
        }
    }

    #[test]
    fn html_login_page_embeds_escaped_client_name() {
        let rendered = helper().send_login_page(false, "/cancel", "<b>evil</b>", ErrorType::NoError, "", "");
        match rendered {
            Rendered::Html(html) => {
                assert!(html.contains("&lt;b&gt;evil&lt;/b&gt;"));
                assert!(!html.contains("<b>evil</b>"));
            }
            Rendered::Json(_) => panic!("expected html"),
        }
    }

    #[test]
    fn cancel_uri_is_not_escaped() {
        let rendered = helper().send_login_page(
            false,
            "/back?error=access_denied&state=a&b",
            "client",
            ErrorType::NoError,
            "",
            "",
        );
        match rendered {
            Rendered::Html(html) => assert!(html.contains("/back?error=access_denied&state=a&b")),
            Rendered::Json(_) => panic!("expected html"),
        }
    }
}
