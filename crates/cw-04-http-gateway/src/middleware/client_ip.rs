//! Client address resolution.
//!
//! Preference: `x-real-ip`, then the first hop of `x-forwarded-for`, then
//! the socket peer. IPv4-mapped IPv6 addresses are reported as IPv4.

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Reported when nothing identifies the client.
pub const UNKNOWN_CLIENT: &str = "0.0.0.0";

/// Resolved client address, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(resolve_client_ip(&parts.headers, peer)))
    }
}

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    ["x-real-ip", "x-forwarded-for"]
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(normalize)
        })
        .or_else(|| peer.map(|ip| ip.to_canonical().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn normalize(raw: &str) -> Option<String> {
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some(first.strip_prefix("::ffff:").unwrap_or(first).to_string())
}
