//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete storage backends.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`memory`] - In-process implementation of every repository trait

pub mod memory;
pub mod persistence;

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{
    ClickRepository, LinkRepository, StatsRepository, UserRepository,
};
use memory::MemoryStore;
use persistence::{PgClickRepository, PgLinkRepository, PgStatsRepository, PgUserRepository};

/// The full set of repositories a running service needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub clicks: Arc<dyn ClickRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            clicks: Arc::new(PgClickRepository::new(pool.clone())),
            stats: Arc::new(PgStatsRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    /// Repositories backed by one shared [`MemoryStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            links: store.clone(),
            clicks: store.clone(),
            stats: store.clone(),
            users: store,
        }
    }
}
