//! Utility functions for slugs, URLs, passwords and tokens.
//!
//! - [`slug`] - Slug generation and custom slug validation
//! - [`url_validator`] - Target URL validation
//! - [`password`] - Argon2id hashing
//! - [`jwt`] - User session tokens
//! - [`unlock_token`] - Signed unlock tokens for protected links

pub mod jwt;
pub mod password;
pub mod slug;
pub mod unlock_token;
pub mod url_validator;
