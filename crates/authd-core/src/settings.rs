/// The five recognized keys in the main config file. Ordering here is the
/// canonical iteration order used when filling in missing keys from defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalSettingKey {
    AuthCodeLifetime,
    AccessTokenLifetime,
    RefreshTokenLifetime,
    SilentModeEnabled,
    SystemUseNotification,
}

impl GlobalSettingKey {
    pub const ALL: [GlobalSettingKey; 5] = [
        GlobalSettingKey::AuthCodeLifetime,
        GlobalSettingKey::AccessTokenLifetime,
        GlobalSettingKey::RefreshTokenLifetime,
        GlobalSettingKey::SilentModeEnabled,
        GlobalSettingKey::SystemUseNotification,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            GlobalSettingKey::AuthCodeLifetime => "auth_code_lifetime",
            GlobalSettingKey::AccessTokenLifetime => "access_token_lifetime",
            GlobalSettingKey::RefreshTokenLifetime => "refresh_token_lifetime",
            GlobalSettingKey::SilentModeEnabled => "silent_mode_enabled",
            GlobalSettingKey::SystemUseNotification => "system_use_notification",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl std::fmt::Display for GlobalSettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
