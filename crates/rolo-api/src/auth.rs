//! Bearer-token extractor, peer address and throttle client key.

use std::{
  convert::Infallible,
  net::{IpAddr, SocketAddr},
};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use rolo_core::identity::Identity;

use crate::{AppState, RoloStore, error::ApiError};

/// The identity behind a valid access token. Present in a handler means the
/// request was authenticated and the identity is currently active.
pub struct Authenticated(pub Identity);

/// The token of an `Authorization: Bearer <token>` header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
}

/// The network address of the caller, as reported by the listener. Absent
/// when the router is driven without connection info.
pub struct PeerAddr(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let peer = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip());
    Ok(PeerAddr(peer))
  }
}

/// The client address login attempts are throttled under.
///
/// Forwarding headers are only believed when the direct peer is one of
/// `trusted` proxies. Then the nearest `X-Forwarded-For` hop that is not
/// itself a trusted proxy wins, falling back to `X-Real-IP` and finally to
/// the peer.
pub fn client_key(
  peer: Option<IpAddr>,
  headers: &HeaderMap,
  trusted: &[IpAddr],
) -> Option<String> {
  let peer = peer?;
  if !trusted.contains(&peer) {
    return Some(peer.to_string());
  }

  let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
  let forwarded = header_str("x-forwarded-for").and_then(|v| {
    v.rsplit(',')
      .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
      .find(|hop| !trusted.contains(hop))
  });
  let real_ip = || header_str("x-real-ip").and_then(|v| v.trim().parse::<IpAddr>().ok());

  Some(forwarded.or_else(real_ip).unwrap_or(peer).to_string())
}

impl<S: RoloStore> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = state.sessions.authenticate(bearer_token(&parts.headers)).await?;
    Ok(Authenticated(identity))
  }
}
