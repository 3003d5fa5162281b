//! Data Transfer Objects for API request/response serialization.
//!
//! DTOs define the public API contract, separate from internal domain models.

pub mod auth;
pub mod health;
pub mod links;
pub mod pagination;
pub mod redirect;
pub mod stats;
