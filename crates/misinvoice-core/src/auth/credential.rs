//! Bearer credential and the claims decoded from it.
//!
//! The backend issues a JWT. The client never verifies the signature; the
//! backend stays the source of truth. The payload is only decoded to learn
//! the role and subject for rendering. Any decoding failure yields "no
//! role", which every caller treats exactly like an absent credential.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::Role;

/// Opaque bearer token. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting empty or whitespace-only input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == token.len() {
            Some(Self(token))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the payload claims, if the token is a well-formed JWT.
    pub fn claims(&self) -> Option<Claims> {
        decode_claims(&self.0)
    }

    /// Role carried by the token, `None` when missing or malformed.
    pub fn role(&self) -> Option<Role> {
        self.claims().and_then(|c| c.role())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}

/// The `role` claim may be a single authority or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject, the account e-mail.
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, alias = "roles", alias = "authorities")]
    role: Option<RoleClaim>,
    /// Expiry as seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Expiry as a timestamp, when the token carries a valid one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp?, 0)
    }

    /// Exactly one recognised role, otherwise `None`.
    pub fn role(&self) -> Option<Role> {
        match self.role.as_ref()? {
            RoleClaim::One(name) => Role::from_claim(name),
            RoleClaim::Many(names) => {
                let mut known = names.iter().filter_map(|n| Role::from_claim(n));
                let first = known.next()?;
                if known.all(|r| r == first) {
                    Some(first)
                } else {
                    None
                }
            }
        }
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        debug!("Credential has too many segments");
        return None;
    }

    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Credential payload is not base64url");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "Credential payload is not a claims object");
            None
        }
    }
}

/// Build an unsigned token with the given payload. Test helper shared by
/// the modules that need realistic credentials.
#[cfg(test)]
pub(crate) fn token_with_payload(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[cfg(test)]
pub(crate) fn credential_for(role: Role) -> Credential {
    let payload = format!(r#"{{"sub":"user@example.com","role":"{}"}}"#, role.claim_name());
    Credential::new(token_with_payload(&payload)).unwrap()
}
