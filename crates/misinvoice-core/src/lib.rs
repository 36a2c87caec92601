//! Core library for the MIS & Invoicing console.
//!
//! Holds the client-side session (credential, role, idle expiry), route
//! authorization, and the REST client. Front ends drive it through
//! [`auth::SessionController`] and render from [`auth::SessionState`]
//! snapshots.

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigator;
pub mod routes;

pub use access::{filter, Decision, NavigationEntry, ProtectedView, ViewState, NAV_ENTRIES};
pub use api::{ApiClient, ApiError};
pub use auth::{ActivitySignal, AuthService, Credential, Role, SessionController, SessionState, SessionStore};
pub use config::{Config, CredentialBackend};
pub use navigator::{ChannelNavigator, Navigator};
pub use routes::{guard, GuardOutcome, Route};
