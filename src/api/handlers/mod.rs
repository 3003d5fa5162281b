//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod health;
pub mod links;
pub mod redirect;
pub mod stats;

pub use auth::{login_handler, me_handler, register_handler};
pub use health::health_handler;
pub use links::{
    bulk_delete_handler, create_link_handler, delete_link_handler, export_links_handler,
    get_link_handler, link_owner_handler, list_links_handler, update_link_handler,
};
pub use redirect::{redirect_handler, verify_handler};
pub use stats::{dashboard_handler, link_stats_handler};
