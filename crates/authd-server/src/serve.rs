use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::routes::router;
use crate::state::AppState;

pub async fn serve_tcp(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "authd listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

pub async fn serve_unix(socket_path: &Path, state: Arc<AppState>) -> anyhow::Result<()> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    let app = router(state);
    let listener = tokio::net::UnixListener::bind(socket_path)?;
    set_socket_permissions(socket_path)?;
    info!(path = %socket_path.display(), "authd listening on unix socket");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o660))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
