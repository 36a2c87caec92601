//! REST API client module for the MIS & Invoicing backend.
//!
//! This module provides the `ApiClient` for the authentication endpoints
//! and the managed-entity collections. Requests carry the session's bearer
//! credential; the backend alone decides whether it is still valid.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
