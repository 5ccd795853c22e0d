use std::sync::Arc;

use authd_auth::Authenticator;
use authd_config::SettingsStore;
use authd_core::GlobalSettingKey;
use authd_templates::{GlobalSettingsView, ResponseHelper};
use authd_token::{KeyRotationPolicy, TokenHandler};

/// Bridges the concrete settings store to the narrow views `authd-token` and
/// `authd-templates` expect, so those crates never need to depend on
/// `authd-config` directly.
struct SettingsAdapter(Arc<SettingsStore>);

impl KeyRotationPolicy for SettingsAdapter {
    fn refresh_token_lifetime_s(&self) -> u32 {
        self.0
            .get_global_setting(GlobalSettingKey::RefreshTokenLifetime)
            .parse()
            .unwrap_or(3600)
    }
}

impl GlobalSettingsView for SettingsAdapter {
    fn system_use_notification(&self) -> String {
        self.0
            .get_global_setting(GlobalSettingKey::SystemUseNotification)
    }

    fn silent_mode_enabled(&self) -> bool {
        self.0
            .get_global_setting(GlobalSettingKey::SilentModeEnabled)
            .parse()
            .unwrap_or(false)
    }
}

pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub token_handler: Arc<TokenHandler>,
    pub authenticator: Arc<Authenticator>,
    pub response_helper: Arc<ResponseHelper>,
    pub base_path: String,
    /// `true` when the server is bound to a Unix domain socket, where every
    /// peer is local by construction; `false` over TCP, where the localhost
    /// check inspects the peer's address instead.
    pub trust_all_as_localhost: bool,
}

impl AppState {
    pub fn new(
        settings: Arc<SettingsStore>,
        authenticator: Arc<Authenticator>,
        hostname: String,
        base_path: String,
        trust_all_as_localhost: bool,
    ) -> Self {
        let token_handler = Arc::new(TokenHandler::new(Box::new(SettingsAdapter(Arc::clone(
            &settings,
        )))));
        let response_helper = Arc::new(ResponseHelper::new(
            hostname,
            Box::new(SettingsAdapter(Arc::clone(&settings))),
        ));
        Self {
            settings,
            token_handler,
            authenticator,
            response_helper,
            base_path,
            trust_all_as_localhost,
        }
    }

    pub fn lifetime_setting(&self, key: GlobalSettingKey, default: u32) -> u32 {
        self.settings
            .get_global_setting(key)
            .parse()
            .unwrap_or(default)
    }
}
