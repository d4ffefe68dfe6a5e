//! Core library for `dolist-sync`.
//!
//! Holds everything that is not HTTP: the persisted API key collection, the
//! request gate that validates user keys and the admin token, and the
//! per-user document store. The server crate wires these into Axum.
//!
//! - [`keys`]: the [`KeyStore`](keys::KeyStore) trait with file and in-memory backends
//! - [`gate`]: bearer header parsing, API key validation, admin token check
//! - [`document`]: key-to-file mapping and user document read/write

pub mod document;
pub mod error;
pub mod gate;
pub mod keys;
