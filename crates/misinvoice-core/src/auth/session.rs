use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::credential::Credential;
use super::storage::{CredentialStorage, StoredCredential};
use super::Role;

/// Snapshot of the current session, handed to everything that renders or
/// authorizes. Readers never mutate it; the controller owns the live copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub credential: Option<Credential>,
    pub role: Option<Role>,
    /// Account e-mail from the `sub` claim, display only
    pub subject: Option<String>,
    /// When the session was established or restored
    pub since: Option<DateTime<Utc>>,
}

impl SessionState {
    fn from_credential(credential: Credential, since: DateTime<Utc>) -> Self {
        let claims = credential.claims();
        let role = claims.as_ref().and_then(|c| c.role());
        let subject = claims.and_then(|c| c.sub);
        Self {
            credential: Some(credential),
            role,
            subject,
            since: Some(since),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Minutes since the session started (for display)
    pub fn minutes_active(&self) -> i64 {
        self.since
            .map(|since| (Utc::now() - since).num_minutes().max(0))
            .unwrap_or(0)
    }
}

/// Current credential plus derived role, mirrored into persisted storage.
pub struct SessionStore {
    storage: Box<dyn CredentialStorage>,
    state: SessionState,
}

impl SessionStore {
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self {
            storage,
            state: SessionState::default(),
        }
    }

    /// Load the persisted credential, if any. Returns whether a session
    /// was restored. Unreadable storage counts as logged out.
    pub fn restore(&mut self) -> bool {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        };

        match stored.and_then(|s| Credential::new(s.token).map(|c| (c, s.stored_at))) {
            Some((credential, stored_at)) => {
                self.state = SessionState::from_credential(credential, stored_at);
                debug!(role = ?self.state.role, "Session restored");
                true
            }
            None => {
                self.state = SessionState::default();
                false
            }
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.state.credential.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.role
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replace the session. Role and subject are derived in the same step,
    /// so no reader ever sees a credential paired with a stale role.
    pub fn set_session(&mut self, credential: Credential) {
        let stored = StoredCredential::new(credential.as_str());
        let since = stored.stored_at;
        if let Err(e) = self.storage.store(&stored) {
            warn!(error = %e, "Failed to persist credential");
        }
        self.state = SessionState::from_credential(credential, since);
        debug!(role = ?self.state.role, "Session set");
    }

    pub fn clear_session(&mut self) {
        self.state = SessionState::default();
        if let Err(e) = self.storage.remove() {
            warn!(error = %e, "Failed to remove stored credential");
        }
    }
}
