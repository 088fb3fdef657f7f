//! Client identity resolution.
//!
//! The identity keys the rate limiter and appears in audit logs. It is the
//! peer address, or the left-most `X-Forwarded-For` entry when the server is
//! configured to trust its upstream proxy.
//!
//! # Design Decisions
//! - Never trust `X-Forwarded-For` unless explicitly configured
//! - A malformed forwarded entry falls back to the peer address

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolved client address, attached to request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIp(pub IpAddr);

/// Resolve the client identity for a request.
pub fn resolve(peer: SocketAddr, headers: &HeaderMap, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(ip) = forwarded_client(headers) {
            return ip;
        }
    }
    peer.ip()
}

fn forwarded_client(headers: &HeaderMap) -> Option<IpAddr> {
    let first = headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim();

    first
        .parse::<IpAddr>()
        .ok()
        .or_else(|| first.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Middleware attaching [`ClientIp`] to the request.
pub async fn client_ip_middleware(
    State(trust_proxy): State<bool>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = resolve(peer, request.headers(), trust_proxy);
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}
