//! Client for the legacy npm registry login API.
//!
//! The only endpoint this crate talks to is the CouchDB-style user document
//! at `-/user/org.couchdb.user:<name>`, which exchanges a username and
//! password for an auth token.

mod api;
mod client;
mod error;
mod notify;

pub use api::login;
pub use client::{RegistryClient, RegistryClientBuilder};
pub use error::RegistryClientError;
