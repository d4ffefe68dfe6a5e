//! `dolist-sync` HTTP server.
//!
//! Wires the key store, admin token gate, and document store from
//! `dolist-core` into an Axum router serving the JSON API under `/api`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
