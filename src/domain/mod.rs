//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces, and the redirect resolution state
//! machine independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`resolution`] - Slug resolution outcomes (not found / expired / gated / resolved)
//!
//! # Click Processing Flow
//!
//! 1. HTTP handler receives `GET /{slug}`
//! 2. [`crate::application::services::RedirectService`] loads the link and evaluates
//!    a [`resolution::Resolution`]
//! 3. On `Resolved`, the click is appended via [`repositories::ClickRepository`] and
//!    the counter is incremented atomically via [`repositories::LinkRepository`]
//! 4. The handler answers with `301 Moved Permanently`

pub mod entities;
pub mod repositories;
pub mod resolution;
