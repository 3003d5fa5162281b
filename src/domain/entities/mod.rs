//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures with only small, self-contained helpers
//! (expiry and ownership checks). Creation inputs live in separate structs:
//!
//! - `NewLink`, `NewClick`, `NewUser` - for creating new records
//! - `LinkPatch` - for partial updates

pub mod click;
pub mod link;
pub mod user;

pub use click::{Click, DailyClicks, NewClick, ReferrerCount};
pub use link::{Link, LinkPatch, NewLink, QrStyle};
pub use user::{NewUser, User};
