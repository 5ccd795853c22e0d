use std::collections::HashMap;

use authd_core::GlobalSettingKey;

use crate::defaults::default_value;
use crate::error::ConfigErrorMap;

/// Parses and cross-validates the four numeric/boolean settings, optionally
/// substituting the compile-time default for any value that fails.
///
/// In lenient mode (`correct_wrong_values = true`, used on reload) invalid
/// values are silently replaced and the function always succeeds. In strict
/// mode (used on the initial load) the first parse error or the first
/// relational violation aborts validation and `Err` is returned with every
/// error collected up to that point.
pub fn validate_global_config(
    values: &mut HashMap<GlobalSettingKey, String>,
    correct_wrong_values: bool,
) -> Result<(), ConfigErrorMap> {
    let mut errors = ConfigErrorMap::new();

    let mut auth_code_lifetime_s = parse_u32_setting(
        values,
        GlobalSettingKey::AuthCodeLifetime,
        &mut errors,
        correct_wrong_values,
    );
    let mut access_token_lifetime_s = parse_u32_setting(
        values,
        GlobalSettingKey::AccessTokenLifetime,
        &mut errors,
        correct_wrong_values,
    );
    let mut refresh_token_lifetime_s = parse_u32_setting(
        values,
        GlobalSettingKey::RefreshTokenLifetime,
        &mut errors,
        correct_wrong_values,
    );
    let silent_mode_enabled = parse_bool_setting(
        values,
        GlobalSettingKey::SilentModeEnabled,
        &mut errors,
        correct_wrong_values,
    );

    if !correct_wrong_values && !errors.is_empty() {
        return Err(errors);
    }

    if auth_code_lifetime_s < 1 {
        errors.insert(
            GlobalSettingKey::AuthCodeLifetime,
            "Has to be at least 1".to_string(),
        );
        if correct_wrong_values {
            auth_code_lifetime_s = default_u32(GlobalSettingKey::AuthCodeLifetime);
        }
    }

    if access_token_lifetime_s < 2 * auth_code_lifetime_s {
        errors.insert(
            GlobalSettingKey::AuthCodeLifetime,
            format!(
                "Has to be 0.5x '{}' at most",
                GlobalSettingKey::AccessTokenLifetime.name()
            ),
        );
        errors.insert(
            GlobalSettingKey::AccessTokenLifetime,
            format!(
                "Has to be 2x '{}' at least",
                GlobalSettingKey::AuthCodeLifetime.name()
            ),
        );
        if correct_wrong_values {
            auth_code_lifetime_s = default_u32(GlobalSettingKey::AuthCodeLifetime);
            access_token_lifetime_s = default_u32(GlobalSettingKey::AccessTokenLifetime);
            refresh_token_lifetime_s = default_u32(GlobalSettingKey::RefreshTokenLifetime);
        }
    }

    if refresh_token_lifetime_s < 2 * access_token_lifetime_s {
        errors.insert(
            GlobalSettingKey::AccessTokenLifetime,
            format!(
                "Has to be 0.5x '{}' at most",
                GlobalSettingKey::RefreshTokenLifetime.name()
            ),
        );
        errors.insert(
            GlobalSettingKey::RefreshTokenLifetime,
            format!(
                "Has to be 2x '{}' at least",
                GlobalSettingKey::AccessTokenLifetime.name()
            ),
        );
        if correct_wrong_values {
            auth_code_lifetime_s = default_u32(GlobalSettingKey::AuthCodeLifetime);
            access_token_lifetime_s = default_u32(GlobalSettingKey::AccessTokenLifetime);
            refresh_token_lifetime_s = default_u32(GlobalSettingKey::RefreshTokenLifetime);
        }
    }

    if !correct_wrong_values && !errors.is_empty() {
        return Err(errors);
    }

    values.insert(
        GlobalSettingKey::AuthCodeLifetime,
        auth_code_lifetime_s.to_string(),
    );
    values.insert(
        GlobalSettingKey::AccessTokenLifetime,
        access_token_lifetime_s.to_string(),
    );
    values.insert(
        GlobalSettingKey::RefreshTokenLifetime,
        refresh_token_lifetime_s.to_string(),
    );
    values.insert(
        GlobalSettingKey::SilentModeEnabled,
        silent_mode_enabled.to_string(),
    );

    Ok(())
}

fn default_u32(key: GlobalSettingKey) -> u32 {
    default_value(key).parse().expect("defaults are well-formed")
}

fn parse_u32_setting(
    values: &HashMap<GlobalSettingKey, String>,
    key: GlobalSettingKey,
    errors: &mut ConfigErrorMap,
    correct_wrong_values: bool,
) -> u32 {
    let raw = values.get(&key).map(String::as_str).unwrap_or("");
    match raw.parse::<u64>() {
        Ok(parsed) if parsed <= u32::MAX as u64 => parsed as u32,
        Ok(_) => {
            errors.insert(key, format!("Exceeds maximum value of {}", u32::MAX));
            if correct_wrong_values {
                default_u32(key)
            } else {
                0
            }
        }
        Err(_) => {
            errors.insert(key, format!("Invalid value for setting '{}'", key.name()));
            if correct_wrong_values {
                default_u32(key)
            } else {
                0
            }
        }
    }
}

fn parse_bool_setting(
    values: &HashMap<GlobalSettingKey, String>,
    key: GlobalSettingKey,
    errors: &mut ConfigErrorMap,
    correct_wrong_values: bool,
) -> bool {
    let raw = values.get(&key).map(String::as_str).unwrap_or("");
    match raw {
        "true" => true,
        "false" => false,
        _ => {
            errors.insert(key, "Invalid value for setting 'silent_mode_enabled'".to_string());
            correct_wrong_values && default_value(key) == "true"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_values() -> HashMap<GlobalSettingKey, String> {
        let mut values = HashMap::new();
        values.insert(GlobalSettingKey::AuthCodeLifetime, "60".into());
        values.insert(GlobalSettingKey::AccessTokenLifetime, "300".into());
        values.insert(GlobalSettingKey::RefreshTokenLifetime, "3600".into());
        values.insert(GlobalSettingKey::SilentModeEnabled, "false".into());
        values
    }

    #[test]
    fn accepts_consistent_defaults() {
        let mut values = base_values();
        assert!(validate_global_config(&mut values, false).is_ok());
    }

    #[test]
    fn strict_mode_rejects_broken_relation() {
        let mut values = base_values();
        values.insert(GlobalSettingKey::AuthCodeLifetime, "200".into());
        let err = validate_global_config(&mut values, false).unwrap_err();
        assert!(err.contains_key(&GlobalSettingKey::AuthCodeLifetime));
        assert!(err.contains_key(&GlobalSettingKey::AccessTokenLifetime));
    }

    #[test]
    fn lenient_mode_corrects_broken_relation() {
        let mut values = base_values();
        values.insert(GlobalSettingKey::AuthCodeLifetime, "200".into());
        assert!(validate_global_config(&mut values, true).is_ok());
        assert_eq!(values[&GlobalSettingKey::AuthCodeLifetime], "60");
        assert_eq!(values[&GlobalSettingKey::AccessTokenLifetime], "300");
        assert_eq!(values[&GlobalSettingKey::RefreshTokenLifetime], "3600");
    }

    #[test]
    fn strict_mode_rejects_garbage_value() {
        let mut values = base_values();
        values.insert(GlobalSettingKey::SilentModeEnabled, "yes".into());
        let err = validate_global_config(&mut values, false).unwrap_err();
        assert!(err.contains_key(&GlobalSettingKey::SilentModeEnabled));
    }
}
