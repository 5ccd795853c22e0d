use std::path::PathBuf;

use clap::Parser;

const LOG_CHANNEL_OPTIONS: &str = "stdout, stderr, syslog, journal";
const LOG_LEVEL_OPTIONS: &str = "off, fatal, error, warning, notice, info, debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChannel {
    Stdout,
    Stderr,
    Syslog,
    Journal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Fatal,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl LogLevel {
    /// `tracing` has no notice/fatal levels; notice folds into info and
    /// fatal folds into error, matching how syslog consumers already treat
    /// those severities as aliases of their neighbors.
    pub fn as_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Fatal | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Notice | LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}

fn parse_log_channel(value: &str) -> Result<LogChannel, String> {
    match value {
        "stdout" => Ok(LogChannel::Stdout),
        "stderr" => Ok(LogChannel::Stderr),
        "syslog" => Ok(LogChannel::Syslog),
        "journal" => Ok(LogChannel::Journal),
        _ => Err(format!(
            "Error in argument for option \"log-channel\": Invalid value \"{value}\", allowed values are: {LOG_CHANNEL_OPTIONS}"
        )),
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    match value {
        "off" => Ok(LogLevel::Off),
        "fatal" => Ok(LogLevel::Fatal),
        "error" => Ok(LogLevel::Error),
        "warning" => Ok(LogLevel::Warning),
        "notice" => Ok(LogLevel::Notice),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        _ => Err(format!(
            "Error in argument for option \"log-level\": Invalid value \"{value}\", allowed values are: {LOG_LEVEL_OPTIONS}"
        )),
    }
}

/// Falls back to the default base path with a warning rather than refusing
/// to start: an operator-supplied `-r` is a convenience, not load-bearing
/// for correctness, so a malformed one shouldn't turn into a startup failure.
pub fn validate_base_path(base_path: Option<String>) -> String {
    match base_path {
        Some(value) if value.len() >= 2 && value.starts_with('/') => value,
        Some(value) => {
            eprintln!(
                "warning: invalid value \"{value}\" for option \"base-path\", falling back to \"{}\"",
                authd_core::definitions::DEFAULT_BASE_PATH
            );
            authd_core::definitions::DEFAULT_BASE_PATH.to_string()
        }
        None => authd_core::definitions::DEFAULT_BASE_PATH.to_string(),
    }
}

#[derive(Parser, Debug)]
#[command(name = "authd", about = "Local OAuth 2.0 authorization server")]
pub struct Cli {
    /// Unix domain socket to listen on.
    #[arg(short = 's', long = "socket", default_value = "/tmp/authserv.fcgi.socket")]
    pub socket_path: PathBuf,

    /// Where to log to.
    #[arg(short = 'c', long = "log-channel", default_value = "syslog", value_parser = parse_log_channel)]
    pub log_channel: LogChannel,

    /// Minimum severity to log.
    #[arg(short = 'l', long = "log-level", default_value = "warning", value_parser = parse_log_level)]
    pub log_level: LogLevel,

    /// Base path the four endpoints are mounted under, e.g. `/auth`.
    #[arg(short = 'r', long = "base-path")]
    pub base_path: Option<String>,

    /// Directory holding `authd.conf` and the `clients`/`resource_servers` subdirectories.
    #[arg(long = "config-dir", default_value = "/etc/authd")]
    pub config_dir: PathBuf,

    /// Public hostname used when rendering absolute URLs (templates' `$HOST$`).
    #[arg(long = "hostname", default_value = "localhost")]
    pub hostname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_channel_rejects_unknown_value() {
        let err = parse_log_channel("carrier-pigeon").unwrap_err();
        assert!(err.contains("log-channel"));
        assert!(err.contains("carrier-pigeon"));
    }

    #[test]
    fn parse_log_level_accepts_every_documented_value() {
        for value in ["off", "fatal", "error", "warning", "notice", "info", "debug"] {
            assert!(parse_log_level(value).is_ok());
        }
    }

    #[test]
    fn validate_base_path_falls_back_on_missing_leading_slash() {
        assert_eq!(validate_base_path(Some("auth".to_string())), "/auth");
    }

    #[test]
    fn validate_base_path_falls_back_on_too_short() {
        assert_eq!(validate_base_path(Some("/".to_string())), "/auth");
    }

    #[test]
    fn validate_base_path_keeps_a_valid_custom_path() {
        assert_eq!(validate_base_path(Some("/oauth2".to_string())), "/oauth2");
    }

    #[test]
    fn validate_base_path_defaults_when_absent() {
        assert_eq!(validate_base_path(None), "/auth");
    }
}
