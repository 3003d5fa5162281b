//! Short-lived unlock tokens for password-protected links.
//!
//! A token has the form `"{expires_unix}.{hex_mac}"` where the MAC is
//! HMAC-SHA256 over `link_id|slug|expires_unix|password_hash`. Binding the
//! password hash means changing or clearing the password revokes every
//! outstanding token for that link.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::MAX_UNLOCK_TOKEN_TTL_SECONDS;
use crate::domain::entities::Link;

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks unlock tokens with the server secret.
pub struct UnlockTokenSigner {
    secret: String,
    ttl: Duration,
}

impl UnlockTokenSigner {
    pub fn new(secret: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(ttl_seconds.min(MAX_UNLOCK_TOKEN_TTL_SECONDS) as i64),
        }
    }

    fn mac(&self, link: &Link, expires: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(link.id.to_string().as_bytes());
        mac.update(b"|");
        mac.update(link.slug.as_bytes());
        mac.update(b"|");
        mac.update(expires.to_string().as_bytes());
        mac.update(b"|");
        mac.update(link.password_hash.as_deref().unwrap_or_default().as_bytes());
        mac
    }

    /// Issues a token for `link` valid until `now + ttl`.
    pub fn issue(&self, link: &Link, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl).timestamp();
        let signature = hex::encode(self.mac(link, expires).finalize().into_bytes());
        format!("{expires}.{signature}")
    }

    /// Returns true if `token` was issued for this link's current password and
    /// has not expired at `now`.
    pub fn verify(&self, link: &Link, token: &str, now: DateTime<Utc>) -> bool {
        let Some((expires, signature)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires) = expires.parse::<i64>() else {
            return false;
        };
        if expires <= now.timestamp() {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        self.mac(link, expires).verify_slice(&signature).is_ok()
    }
}
