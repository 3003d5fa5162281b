//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, updates and the atomic click counter
//! - [`PgClickRepository`] - Click log inserts and per-link aggregations
//! - [`PgStatsRepository`] - Owner-scoped dashboard rollups
//! - [`PgUserRepository`] - User accounts

pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_stats_repository;
pub mod pg_user_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_stats_repository::PgStatsRepository;
pub use pg_user_repository::PgUserRepository;
