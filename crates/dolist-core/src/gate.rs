//! Request gate: the two authorization contracts of `dolist-sync`.
//!
//! - User requests carry `Authorization: Bearer <key>`. The key must be an
//!   exact member of the [`KeyStore`]; the verified key becomes the storage
//!   identity for the request.
//! - Admin requests carry `Admin-Token: <token>`, compared in constant time
//!   against the configured [`AdminToken`]. No persisted state is read.

use subtle::ConstantTimeEq;

use crate::error::GateError;
use crate::keys::KeyStore;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value.
///
/// The token is the first space-separated segment after `Bearer `.
///
/// # Errors
///
/// - [`GateError::MissingCredential`] if there is no header.
/// - [`GateError::MalformedCredential`] if the header is not `Bearer <token>`.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, GateError> {
    let header = header.ok_or(GateError::MissingCredential)?;
    let rest = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GateError::MalformedCredential)?;

    match rest.split(' ').next() {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(GateError::MalformedCredential),
    }
}

/// Validate an `Authorization` header against the key collection.
///
/// Returns the verified API key. The collection is consulted on every call.
///
/// # Errors
///
/// - [`GateError::MissingCredential`] / [`GateError::MalformedCredential`]
///   for a missing or malformed header.
/// - [`GateError::InvalidApiKey`] if the key is not in the collection.
/// - [`GateError::KeyStore`] if the collection cannot be read.
pub async fn validate_api_key(
    store: &dyn KeyStore,
    header: Option<&str>,
) -> Result<String, GateError> {
    let token = parse_bearer(header)?;

    if store.contains(token).await? {
        Ok(token.to_owned())
    } else {
        Err(GateError::InvalidApiKey)
    }
}

/// The static secret that authorizes key minting.
#[derive(Clone)]
pub struct AdminToken(String);

impl AdminToken {
    /// Wrap a configured secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Check a presented `Admin-Token` header value.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidAdminToken`] if the header is missing or
    /// does not exactly equal the secret.
    pub fn validate(&self, presented: Option<&str>) -> Result<(), GateError> {
        let presented = presented.ok_or(GateError::InvalidAdminToken)?;
        if bool::from(presented.as_bytes().ct_eq(self.0.as_bytes())) {
            Ok(())
        } else {
            Err(GateError::InvalidAdminToken)
        }
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminToken([redacted])")
    }
}
