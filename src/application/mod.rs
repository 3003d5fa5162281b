//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - Slug resolution and click accounting
//! - [`services::link_service::LinkService`] - Link creation and owner-scoped management
//! - [`services::stats_service::StatsService`] - Dashboard and per-link analytics
//! - [`services::auth_service::AuthService`] - Accounts and session tokens

pub mod services;
