//! Slug generation and validation utilities.
//!
//! Generated slugs are 6 characters of `[a-z0-9]`. Custom slugs may also use
//! `_` and `-` and range from 3 to 20 characters.

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Length of generated slugs.
pub const GENERATED_SLUG_LENGTH: usize = 6;

pub const MIN_SLUG_LENGTH: usize = 3;
pub const MAX_SLUG_LENGTH: usize = 20;

const GENERATED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Slugs that would shadow top-level routes.
pub const RESERVED_SLUGS: &[&str] = &["api", "health", "static", "admin"];

/// Generates a random slug from the thread-local, OS-seeded RNG.
///
/// Uniqueness is not checked here; the link store's unique constraint decides.
pub fn generate_slug() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_SLUG_LENGTH)
        .map(|_| GENERATED_ALPHABET[rng.random_range(0..GENERATED_ALPHABET.len())] as char)
        .collect()
}

/// Trims and lowercases a user-supplied slug, then validates it.
///
/// Returns the normalized slug. Characters outside `[a-z0-9_-]` are rejected,
/// never stripped.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the slug has the wrong length, contains
/// a disallowed character, or is reserved.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_custom_slug(" Promo1 ").unwrap(), "promo1");
/// assert!(normalize_custom_slug("my link").is_err());
/// assert!(normalize_custom_slug("api").is_err());
/// ```
pub fn normalize_custom_slug(candidate: &str) -> Result<String, AppError> {
    let slug = candidate.trim().to_ascii_lowercase();
    let length = slug.chars().count();

    if !(MIN_SLUG_LENGTH..=MAX_SLUG_LENGTH).contains(&length) {
        return Err(AppError::bad_request(
            format!("Slug must be {MIN_SLUG_LENGTH}-{MAX_SLUG_LENGTH} characters"),
            json!({ "field": "slug", "provided_length": length }),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(AppError::bad_request(
            "Slug can only contain lowercase letters, digits, underscores, and hyphens",
            json!({ "field": "slug", "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "field": "slug", "slug": slug }),
        ));
    }

    Ok(slug)
}
