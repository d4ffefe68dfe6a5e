//! Error types for `dolist-core`.
//!
//! Variants carry the file path and the underlying reason so a log line is
//! enough to diagnose the problem. API keys and the admin token never appear
//! in error messages.

/// Errors from the API key collection.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// The key file could not be read.
    #[error("failed to read key file '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The key file exists but is not a JSON array of strings.
    #[error("key file '{path}' is malformed: {reason}")]
    Parse { path: String, reason: String },

    /// The key file could not be written.
    #[error("failed to write key file '{path}': {reason}")]
    Write { path: String, reason: String },
}

/// Errors from user document storage.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document file exists but could not be read.
    #[error("failed to read document '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The document file exists but does not contain valid JSON.
    #[error("document '{path}' is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// The document file could not be written.
    #[error("failed to write document '{path}': {reason}")]
    Write { path: String, reason: String },

    /// The data directory could not be created.
    #[error("failed to create data directory '{path}': {reason}")]
    DataDir { path: String, reason: String },

    /// The client sent an update that is not usable.
    #[error("invalid document update: {reason}")]
    InvalidUpdate { reason: String },
}

/// Errors from the request gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// No `Authorization` header was sent.
    #[error("missing API key")]
    MissingCredential,

    /// The `Authorization` header is not of the form `Bearer <key>`.
    #[error("malformed Authorization header, expected 'Bearer <key>'")]
    MalformedCredential,

    /// The bearer token is not in the key collection.
    #[error("invalid API key")]
    InvalidApiKey,

    /// The `Admin-Token` header is missing or wrong.
    #[error("admin token required")]
    InvalidAdminToken,

    /// The key collection could not be consulted.
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
}
