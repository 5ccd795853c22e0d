mod backends;
mod cli;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use authd_auth::Authenticator;
use authd_config::{SettingsStore, StorePaths};
use authd_server::AppState;
use backends::{AllowAllGroups, InMemoryCredentials};
use cli::Cli;

const BLACKLIST_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_channel, cli.log_level);

    let base_path = cli::validate_base_path(cli.base_path.clone());

    let settings = match SettingsStore::load(StorePaths::new(cli.config_dir.clone())) {
        Ok(settings) => Arc::new(settings),
        Err(err) => {
            error!(error = %err, config_dir = %cli.config_dir.display(), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let credentials = Arc::new(InMemoryCredentials::new());
    let groups = Arc::new(AllowAllGroups::from_scopes(&settings.get_all_scopes()));
    let authenticator = Arc::new(Authenticator::new(
        credentials.clone(),
        credentials,
        groups,
    ));

    let state = Arc::new(AppState::new(
        Arc::clone(&settings),
        authenticator,
        cli.hostname.clone(),
        base_path,
        true,
    ));

    spawn_blacklist_cleanup(Arc::clone(&state));

    info!(socket = %cli.socket_path.display(), "starting authd");
    if let Err(err) = authd_server::serve_unix(&cli.socket_path, state).await {
        error!(error = %err, "authd exited with an error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// One periodic task sweeps expired entries out of the revocation blacklist
/// so it doesn't grow unbounded over the daemon's lifetime.
fn spawn_blacklist_cleanup(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(BLACKLIST_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            state.token_handler.cleanup_blacklist();
        }
    });
}
