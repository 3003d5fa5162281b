//! Redirect resolution state machine.
//!
//! A slug lookup ends in exactly one of four states, evaluated in order:
//!
//! 1. [`Resolution::NotFound`] - no link with that slug
//! 2. [`Resolution::Expired`] - `expires_at <= now`, regardless of password state
//! 3. [`Resolution::PasswordGated`] - protected and not unlocked by this request
//! 4. [`Resolution::Resolved`] - the only state that counts as a click
//!
//! These are expected outcomes, not errors. Storage failures are reported
//! separately by the caller.

use chrono::{DateTime, Utc};

use crate::domain::entities::Link;

/// Outcome of resolving a slug.
#[derive(Debug, Clone)]
pub enum Resolution {
    NotFound,
    Expired { slug: String },
    PasswordGated { slug: String },
    Resolved { link: Link },
}

impl Resolution {
    /// Evaluates a looked-up link against the clock and the request's unlock.
    ///
    /// `is_unlocked` is only invoked for protected, unexpired links, so expensive
    /// password checks are skipped for every other state.
    pub fn evaluate(
        link: Option<Link>,
        now: DateTime<Utc>,
        is_unlocked: impl FnOnce(&Link) -> bool,
    ) -> Self {
        let Some(link) = link else {
            return Resolution::NotFound;
        };

        if link.is_expired_at(now) {
            return Resolution::Expired { slug: link.slug };
        }

        if link.is_protected() && !is_unlocked(&link) {
            return Resolution::PasswordGated { slug: link.slug };
        }

        Resolution::Resolved { link }
    }

    /// Short label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::NotFound => "not_found",
            Resolution::Expired { .. } => "expired",
            Resolution::PasswordGated { .. } => "password_gated",
            Resolution::Resolved { .. } => "resolved",
        }
    }
}
