//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `Credential` / `Role`: the bearer token and the role decoded from it
//! - `SessionStore`: current session mirrored into persisted storage
//! - `CredentialStorage`: file, OS keychain, or in-memory persistence
//! - `SessionController`: restore, login, logout, and idle expiry
//!
//! Sessions expire after 30 minutes without user activity.

pub mod controller;
pub mod credential;
pub mod role;
pub mod session;
pub mod storage;
pub mod watchdog;

pub use controller::{AuthService, SessionController};
pub use credential::{Claims, Credential};
pub use role::Role;
pub use session::{SessionState, SessionStore};
pub use storage::{
    CredentialStorage, FileStorage, KeyringStorage, MemoryStorage, StorageError, StoredCredential,
};
pub use watchdog::{ActivitySignal, IdleWatchdog, IDLE_TIMEOUT};
