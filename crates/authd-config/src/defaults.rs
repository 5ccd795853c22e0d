use authd_core::GlobalSettingKey;

/// Compile-time defaults substituted for any key missing from the config file
/// and for any key that fails validation in lenient mode. These mirror the
/// example values in the main config file's documentation.
pub fn default_value(key: GlobalSettingKey) -> &'static str {
    match key {
        GlobalSettingKey::AuthCodeLifetime => "60",
        GlobalSettingKey::AccessTokenLifetime => "300",
        GlobalSettingKey::RefreshTokenLifetime => "3600",
        GlobalSettingKey::SilentModeEnabled => "false",
        GlobalSettingKey::SystemUseNotification => "",
    }
}
