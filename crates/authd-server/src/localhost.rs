use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;

/// Mirrors `Option<ConnectInfo<SocketAddr>>` as a handler argument: present
/// when the server is bound over TCP via `into_make_service_with_connect_info`,
/// absent for Unix-domain-socket binds where no peer address extension is set.
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S> axum::extract::FromRequestParts<S> for PeerAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Unix-domain-socket connections are inherently local (only a process on
/// this machine can hold the path), so a server bound that way trusts every
/// peer by construction. A TCP-bound server instead checks the peer address.
pub fn is_localhost(trust_all: bool, peer: Option<SocketAddr>) -> bool {
    if trust_all {
        return true;
    }
    peer.map(|addr| addr.ip().is_loopback()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_socket_server_trusts_every_peer() {
        assert!(is_localhost(true, None));
    }

    #[test]
    fn tcp_server_trusts_only_loopback_peers() {
        let loopback: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let remote: SocketAddr = "203.0.113.5:9000".parse().unwrap();
        assert!(is_localhost(false, Some(loopback)));
        assert!(!is_localhost(false, Some(remote)));
        assert!(!is_localhost(false, None));
    }
}
