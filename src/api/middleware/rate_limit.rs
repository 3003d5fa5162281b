//! Rate limiting middleware using token bucket algorithm.

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::state::AppState;

/// How client keys are derived for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    /// No rate limiting. Used by in-process tests that have no peer address.
    Off,
    /// Key on the socket peer address.
    PeerIp,
    /// Key on `X-Forwarded-For` / `X-Real-IP`, falling back to the peer address.
    /// Enable only behind a trusted reverse proxy.
    ForwardedIp,
}

impl RateLimiting {
    pub fn from_proxy_flag(behind_proxy: bool) -> Self {
        if behind_proxy {
            Self::ForwardedIp
        } else {
            Self::PeerIp
        }
    }
}

/// Limits for one group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Redirects and other public reads: 2 req/s, burst 100.
    Public,
    /// Link creation, password verification and auth: 1 req/s, burst 10.
    Secure,
}

impl Tier {
    fn limits(self) -> (u64, u32) {
        match self {
            Tier::Public => (2, 100),
            Tier::Secure => (1, 10),
        }
    }
}

/// Applies the `tier` limiter to `router` according to `mode`.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let routes = rate_limit::apply(
///     Router::new().route("/{slug}/verify", post(verify_handler)),
///     Tier::Secure,
///     RateLimiting::PeerIp,
/// );
/// ```
pub fn apply(router: Router<AppState>, tier: Tier, mode: RateLimiting) -> Router<AppState> {
    match mode {
        RateLimiting::Off => router,
        RateLimiting::PeerIp => router.layer(layer(PeerIpKeyExtractor, tier)),
        RateLimiting::ForwardedIp => router.layer(layer(SmartIpKeyExtractor, tier)),
    }
}

/// Builds a governor layer for `tier` keyed by `key_extractor`.
pub fn layer<K>(
    key_extractor: K,
    tier: Tier,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>
where
    K: KeyExtractor,
{
    let (per_second, burst_size) = tier.limits();

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}
