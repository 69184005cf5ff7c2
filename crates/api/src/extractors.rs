//! Request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use portfolio_core::{RequestContext, SESSION_HEADER};

/// Whether `X-Forwarded-For`/`X-Real-IP` come from a proxy we control.
///
/// Off by default: any client can set those headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustProxy(pub bool);

/// Client IP address.
///
/// The socket peer. Behind a trusted proxy, the first `X-Forwarded-For`
/// hop, then `X-Real-IP`, then the peer.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Key for per-client bookkeeping.
    pub fn key(&self) -> &str {
        self.0.as_deref().unwrap_or(portfolio_core::events::UNKNOWN_IP)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    TrustProxy: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TrustProxy(trusted) = TrustProxy::from_ref(state);
        if trusted {
            if let Some(ip) = forwarded_ip(&parts.headers) {
                return Ok(ClientIp(Some(ip)));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientIp(peer))
    }
}

/// Request metadata stamped onto stored records.
#[derive(Debug, Clone)]
pub struct RequestMeta(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    TrustProxy: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ClientIp(ip) = ClientIp::from_request_parts(parts, state).await?;
        let user_agent = header_str(&parts.headers, header::USER_AGENT.as_str());
        let referrer = header_str(&parts.headers, header::REFERER.as_str())
            .or_else(|| header_str(&parts.headers, "referrer"));

        Ok(RequestMeta(RequestContext::new(
            ip.as_deref(),
            user_agent,
            referrer,
        )))
    }
}

/// Session id supplied by header, if any.
#[derive(Debug, Clone, Default)]
pub struct SessionHeader(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionHeader(
            header_str(&parts.headers, SESSION_HEADER).map(str::to_string),
        ))
    }
}
