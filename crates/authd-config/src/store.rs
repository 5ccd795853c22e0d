use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use authd_core::{GlobalSettingKey, OAuthClient, ResourceServer};
use tracing::{info, warn};

use crate::defaults::default_value;
use crate::error::{ConfigError, ConfigErrorMap};
use crate::parse::{
    id_from_file_name, is_config_file_name, is_editor_temp_name, split_key_value,
    strip_comment_and_trim,
};
use crate::validate::validate_global_config;

pub const MAIN_CONFIG_FILE_NAME: &str = "authd.conf";
pub const CLIENTS_DIR_NAME: &str = "clients";
pub const RESOURCE_SERVERS_DIR_NAME: &str = "resource_servers";

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub config_dir: PathBuf,
}

impl StorePaths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn main_config_file(&self) -> PathBuf {
        self.config_dir.join(MAIN_CONFIG_FILE_NAME)
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.config_dir.join(CLIENTS_DIR_NAME)
    }

    pub fn resource_servers_dir(&self) -> PathBuf {
        self.config_dir.join(RESOURCE_SERVERS_DIR_NAME)
    }
}

struct LoadedConfig {
    clients: Vec<OAuthClient>,
    resource_servers: Vec<ResourceServer>,
    scopes: Vec<String>,
}

/// Loads, validates, hot-reloads, and serves the three configuration
/// surfaces: global settings, registered clients, and resource servers.
///
/// Two mutexes guard disjoint state, matching the fine-grained locking model:
/// `global_settings` is taken for the hot path (`get_global_setting`), while
/// `loaded` serializes the whole load/reload/write critical section.
pub struct SettingsStore {
    paths: StorePaths,
    global_settings: Mutex<HashMap<GlobalSettingKey, String>>,
    loaded: Mutex<LoadedConfig>,
}

impl SettingsStore {
    /// Performs the initial, strict load. Any validation or directory error
    /// is fatal: the caller should treat `Err` as a reason to abort startup
    /// rather than run with defaulted or partial configuration.
    pub fn load(paths: StorePaths) -> Result<Self, ConfigError> {
        let globals = load_global_config(&paths.main_config_file(), true)?;
        let clients = parse_all_files(&paths.clients_dir(), true, create_client)?;
        let resource_servers =
            parse_all_files(&paths.resource_servers_dir(), true, create_resource_server)?;
        let scopes = materialize_scopes(&resource_servers);

        Ok(Self {
            paths,
            global_settings: Mutex::new(globals),
            loaded: Mutex::new(LoadedConfig {
                clients,
                resource_servers,
                scopes,
            }),
        })
    }

    /// Re-reads every config surface from disk. Global settings reload
    /// leniently: an out-of-range value is replaced by its default rather
    /// than aborting the reload. Clients and resource servers still reload
    /// strictly. Never propagates a failure to the caller: on error the
    /// previous in-memory state is restored intact and the failure is only
    /// logged.
    pub fn reload_config(&self) {
        let globals = match load_global_config(&self.paths.main_config_file(), false) {
            Ok(globals) => globals,
            Err(err) => {
                warn!(error = %err, "reload_config: failed to reload global settings, keeping previous state");
                return;
            }
        };
        let clients = match parse_all_files(&self.paths.clients_dir(), true, create_client) {
            Ok(clients) => clients,
            Err(err) => {
                warn!(error = %err, "reload_config: failed to reload clients, keeping previous state");
                return;
            }
        };
        let resource_servers = match parse_all_files(
            &self.paths.resource_servers_dir(),
            true,
            create_resource_server,
        ) {
            Ok(resource_servers) => resource_servers,
            Err(err) => {
                warn!(error = %err, "reload_config: failed to reload resource servers, keeping previous state");
                return;
            }
        };
        let scopes = materialize_scopes(&resource_servers);

        *self.global_settings.lock().unwrap() = globals;
        *self.loaded.lock().unwrap() = LoadedConfig {
            clients,
            resource_servers,
            scopes,
        };
        info!("reload_config: configuration reloaded");
    }

    pub fn get_global_setting(&self, key: GlobalSettingKey) -> String {
        self.global_settings
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| default_value(key).to_string())
    }

    /// Merges `new_values` over the existing cache (new values win), then
    /// validates the combined map strictly. On success every key is written
    /// back to disk and the cache is updated; on failure neither disk nor
    /// cache is touched and the per-key error map is returned.
    pub fn set_global_config(
        &self,
        new_values: HashMap<GlobalSettingKey, String>,
    ) -> Result<(), ConfigErrorMap> {
        let loaded_guard = self.loaded.lock().unwrap();
        let mut merged = self.global_settings.lock().unwrap().clone();
        for (key, value) in new_values {
            merged.insert(key, value);
        }

        validate_global_config(&mut merged, false)?;

        if let Err(err) = rewrite_main_config_file(&self.paths.main_config_file(), &merged) {
            let mut errors = ConfigErrorMap::new();
            errors.insert(
                GlobalSettingKey::AuthCodeLifetime,
                format!("failed to persist configuration: {err}"),
            );
            return Err(errors);
        }

        *self.global_settings.lock().unwrap() = merged;
        drop(loaded_guard);
        Ok(())
    }

    pub fn client_exists(&self, client_id: &str) -> bool {
        self.loaded
            .lock()
            .unwrap()
            .clients
            .iter()
            .any(|c| c.id == client_id)
    }

    pub fn get_client(&self, client_id: &str) -> Result<OAuthClient, ConfigError> {
        self.loaded
            .lock()
            .unwrap()
            .clients
            .iter()
            .find(|c| c.id == client_id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownClient(client_id.to_string()))
    }

    pub fn get_all_scopes(&self) -> Vec<String> {
        self.loaded.lock().unwrap().scopes.clone()
    }
}

fn materialize_scopes(resource_servers: &[ResourceServer]) -> Vec<String> {
    resource_servers
        .iter()
        .flat_map(ResourceServer::scope_names)
        .collect()
}

fn load_global_config(
    path: &Path,
    strict_errors: bool,
) -> Result<HashMap<GlobalSettingKey, String>, ConfigError> {
    let mut result = HashMap::new();

    match fs::File::open(path) {
        Ok(file) => {
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let Some(stripped) = strip_comment_and_trim(&line) else {
                    continue;
                };
                let Some((key_name, value)) = split_key_value(&stripped) else {
                    continue;
                };
                match GlobalSettingKey::from_name(&key_name) {
                    Some(key) => {
                        result.insert(key, value);
                    }
                    None => warn!(key = %key_name, "unknown setting in config file, discarding"),
                }
            }
        }
        Err(source) => {
            if strict_errors {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
            warn!(path = %path.display(), error = %source, "failed to open main config file, using defaults");
        }
    }

    for key in GlobalSettingKey::ALL {
        result.entry(key).or_insert_with(|| {
            let default = default_value(key).to_string();
            info!(
                setting = key.name(),
                path = %path.display(),
                default = %default,
                "config value not specified, using default value"
            );
            default
        });
    }

    validate_global_config(&mut result, !strict_errors).map_err(|errors| {
        let joined = errors
            .iter()
            .map(|(key, message)| format!("{key} has an invalid value: {message}"))
            .collect::<Vec<_>>()
            .join("\n");
        ConfigError::Invalid(joined)
    })?;

    Ok(result)
}

fn rewrite_main_config_file(
    path: &Path,
    values: &HashMap<GlobalSettingKey, String>,
) -> std::io::Result<()> {
    let tmp_path = path.with_extension("conf.tmp");
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        for key in GlobalSettingKey::ALL {
            let value = values.get(&key).map(String::as_str).unwrap_or_default();
            writeln!(tmp, "{} = {}", key.name(), value)?;
        }
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

fn parse_all_files<T>(
    dir: &Path,
    strict_errors: bool,
    converter: impl Fn(&str, &str) -> Result<T, String>,
) -> Result<Vec<T>, ConfigError> {
    let mut items = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            if strict_errors {
                return Err(ConfigError::Io {
                    path: dir.display().to_string(),
                    source,
                });
            }
            warn!(path = %dir.display(), error = %source, "failed to open directory, skipping");
            return Ok(items);
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };

        if is_editor_temp_name(name) {
            continue;
        }
        if !is_config_file_name(name) {
            warn!(file = %name, "isn't a valid config file name, skipping");
            continue;
        }

        let id = id_from_file_name(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(file = %name, error = %err, "failed to read config file, skipping");
                continue;
            }
        };
        match converter(id, &contents) {
            Ok(item) => items.push(item),
            Err(message) => warn!(file = %name, error = %message, "failed to parse config file, skipping"),
        }
    }

    Ok(items)
}

fn parse_lines(contents: &str) -> impl Iterator<Item = (String, String)> + '_ {
    contents
        .lines()
        .filter_map(strip_comment_and_trim)
        .filter_map(|line| split_key_value(&line))
}

fn create_client(id: &str, contents: &str) -> Result<OAuthClient, String> {
    let mut label = id.to_string();
    let mut redirect_uri = String::new();
    let mut grant_types = HashSet::new();

    for (key, value) in parse_lines(contents) {
        match key.as_str() {
            "label" => label = value,
            "redirect_uri" => redirect_uri = value,
            "grant_types" => {
                grant_types = value
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => warn!(client = %id, key = %other, "unknown client config key, ignoring"),
        }
    }

    if grant_types.contains("authorization_code") && redirect_uri.is_empty() {
        return Err(
            "clients supporting authorization_code must specify a redirect_uri".to_string(),
        );
    }

    Ok(OAuthClient {
        id: id.to_string(),
        label,
        redirect_uri,
        grant_types,
    })
}

fn create_resource_server(id: &str, contents: &str) -> Result<ResourceServer, String> {
    let mut label = id.to_string();
    let mut scopes = Vec::new();

    for (key, value) in parse_lines(contents) {
        match key.as_str() {
            "label" => label = value,
            "scopes" => {
                scopes = value
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => warn!(resource_server = %id, key = %other, "unknown resource server config key, ignoring"),
        }
    }

    Ok(ResourceServer {
        id: id.to_string(),
        label,
        scopes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_main_config(dir: &Path, body: &str) {
        fs::write(dir.join(MAIN_CONFIG_FILE_NAME), body).unwrap();
    }

    fn setup(dir: &Path) {
        fs::create_dir_all(dir.join(CLIENTS_DIR_NAME)).unwrap();
        fs::create_dir_all(dir.join(RESOURCE_SERVERS_DIR_NAME)).unwrap();
    }

    #[test]
    fn loads_defaults_when_file_missing_values() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(dir.path(), "auth_code_lifetime = 60\n");

        let store = SettingsStore::load(StorePaths::new(dir.path())).unwrap();
        assert_eq!(
            store.get_global_setting(GlobalSettingKey::AccessTokenLifetime),
            "300"
        );
    }

    #[test]
    fn strict_initial_load_fails_on_broken_relation() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(
            dir.path(),
            "auth_code_lifetime = 200\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\n",
        );

        assert!(SettingsStore::load(StorePaths::new(dir.path())).is_err());
    }

    #[test]
    fn reload_substitutes_defaults_instead_of_aborting() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(
            dir.path(),
            "auth_code_lifetime = 60\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\n",
        );
        let store = SettingsStore::load(StorePaths::new(dir.path())).unwrap();

        write_main_config(
            dir.path(),
            "auth_code_lifetime = 200\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\n",
        );
        store.reload_config();

        assert_eq!(
            store.get_global_setting(GlobalSettingKey::AuthCodeLifetime),
            "60"
        );
    }

    #[test]
    fn client_requires_redirect_uri_for_authorization_code_grant() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(dir.path(), "");
        fs::write(
            dir.path().join(CLIENTS_DIR_NAME).join("c1.conf"),
            "label = Client One\ngrant_types = authorization_code\n",
        )
        .unwrap();

        let store = SettingsStore::load(StorePaths::new(dir.path())).unwrap();
        assert!(!store.client_exists("c1"));
    }

    #[test]
    fn loads_client_and_resource_server() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(dir.path(), "");
        fs::write(
            dir.path().join(CLIENTS_DIR_NAME).join("c1.conf"),
            "label = Client One\nredirect_uri = /back\ngrant_types = authorization_code\n",
        )
        .unwrap();
        fs::write(
            dir.path()
                .join(RESOURCE_SERVERS_DIR_NAME)
                .join("rs.conf"),
            "label = RS\nscopes = s\n",
        )
        .unwrap();

        let store = SettingsStore::load(StorePaths::new(dir.path())).unwrap();
        assert!(store.client_exists("c1"));
        let client = store.get_client("c1").unwrap();
        assert_eq!(client.redirect_uri, "/back");
        assert_eq!(store.get_all_scopes(), vec!["rs:s".to_string()]);
    }

    #[test]
    fn set_global_config_rejects_and_leaves_disk_unchanged() {
        let dir = tempdir().unwrap();
        setup(dir.path());
        write_main_config(
            dir.path(),
            "auth_code_lifetime = 60\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\nsilent_mode_enabled = false\n",
        );
        let store = SettingsStore::load(StorePaths::new(dir.path())).unwrap();

        let mut bad = HashMap::new();
        bad.insert(GlobalSettingKey::AuthCodeLifetime, "200".to_string());
        let errors = store.set_global_config(bad).unwrap_err();
        assert!(errors.contains_key(&GlobalSettingKey::AuthCodeLifetime));
        assert!(errors.contains_key(&GlobalSettingKey::AccessTokenLifetime));

        assert_eq!(
            store.get_global_setting(GlobalSettingKey::AuthCodeLifetime),
            "60"
        );
        let on_disk = fs::read_to_string(dir.path().join(MAIN_CONFIG_FILE_NAME)).unwrap();
        assert!(on_disk.contains("auth_code_lifetime = 60"));
    }
}
