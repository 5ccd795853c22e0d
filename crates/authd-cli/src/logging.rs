use tracing_subscriber::fmt;

use crate::cli::{LogChannel, LogLevel};

/// `tracing-subscriber` has no built-in syslog or systemd-journal writer and
/// the workspace carries no crate for either, so both channels fall back to
/// stderr — a daemon still gets its log lines, just not routed through the
/// platform's native channel.
pub fn init(channel: LogChannel, level: LogLevel) {
    let filter = level.as_filter();
    let builder = fmt().with_max_level(filter).with_target(false);

    match channel {
        LogChannel::Stdout => builder.with_writer(std::io::stdout).init(),
        LogChannel::Stderr | LogChannel::Syslog | LogChannel::Journal => {
            builder.with_writer(std::io::stderr).init()
        }
    }
}
