//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, RedirectService, StatsService};
use crate::config::Config;
use crate::infrastructure::Repositories;
use crate::utils::jwt::JwtService;
use crate::utils::unlock_token::UnlockTokenSigner;

/// Request-independent settings handlers need.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Public origin without trailing slash, used to build `short_url`.
    pub base_url: String,
    pub allow_anonymous_links: bool,
    /// Label reported by the health check.
    pub storage: &'static str,
}

impl AppSettings {
    /// Builds the public short URL for `slug`.
    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url, slug)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService>,
    pub link_service: Arc<LinkService>,
    pub stats_service: Arc<StatsService>,
    pub auth_service: Arc<AuthService>,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    /// Wires every service over one set of repositories.
    pub fn new(repositories: Repositories, config: &Config, storage: &'static str) -> Self {
        let Repositories {
            links,
            clicks,
            stats,
            users,
        } = repositories;

        let signer = UnlockTokenSigner::new(
            config.token_signing_secret.clone(),
            config.unlock_token_ttl_seconds,
        );
        let jwt = JwtService::new(&config.token_signing_secret, config.jwt_ttl_hours);

        Self {
            redirect_service: Arc::new(RedirectService::new(links.clone(), clicks.clone(), signer)),
            link_service: Arc::new(LinkService::new(links.clone(), users.clone())),
            stats_service: Arc::new(StatsService::new(stats, links, clicks)),
            auth_service: Arc::new(AuthService::new(users, jwt)),
            settings: Arc::new(AppSettings {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                allow_anonymous_links: config.allow_anonymous_links,
                storage,
            }),
        }
    }
}
