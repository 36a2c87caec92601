//! Session lifecycle: startup restore, login, logout, idle expiry.
//!
//! The controller is the only writer of the session. Everything else
//! reads [`SessionState`] snapshots.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::credential::Credential;
use super::session::{SessionState, SessionStore};
use super::watchdog::{ActivitySignal, IdleWatchdog};
use super::Role;
use crate::navigator::Navigator;
use crate::routes::Route;

/// Remote side of the session.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Invalidate the credential on the backend.
    async fn logout(&self, credential: &Credential) -> Result<()>;
}

pub struct SessionController {
    store: SessionStore,
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    idle_timeout: Duration,
    watchdog: Option<IdleWatchdog>,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            auth,
            navigator,
            idle_timeout,
            watchdog: None,
        }
    }

    /// Restore a persisted session. No validation round-trip: a revoked
    /// credential is only discovered when a later request is rejected.
    pub fn restore(&mut self) -> bool {
        let restored = self.store.restore();
        if restored {
            info!(role = ?self.store.role(), "Restored session from storage");
            self.arm_watchdog();
        }
        restored
    }

    pub fn session(&self) -> &SessionState {
        self.store.state()
    }

    pub fn role(&self) -> Option<Role> {
        self.store.role()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.state().is_authenticated()
    }

    pub fn watchdog_armed(&self) -> bool {
        self.watchdog.is_some()
    }

    /// Establish a session from a freshly issued credential and go to the
    /// landing page.
    pub fn login(&mut self, credential: Credential) {
        self.store.set_session(credential);
        info!(role = ?self.store.role(), "Logged in");
        self.arm_watchdog();
        self.navigator.navigate(Route::LANDING.path());
    }

    /// Log out. The local effect (watchdog torn down, session cleared,
    /// navigation to the login page) happens before this returns and does
    /// not depend on the backend. The remote invalidation runs in the
    /// background; its failure is only logged. Safe to call repeatedly.
    ///
    /// Returns the handle of the remote call, if there was a credential to
    /// invalidate.
    pub fn logout(&mut self) -> Option<JoinHandle<()>> {
        self.watchdog = None;
        let credential = self.store.credential().cloned();
        self.store.clear_session();
        self.navigator.navigate(Route::Login.path());

        let credential = credential?;
        info!("Logged out");
        let auth = Arc::clone(&self.auth);
        Some(tokio::spawn(async move {
            match auth.logout(&credential).await {
                Ok(()) => debug!("Remote logout succeeded"),
                Err(e) => warn!(error = %e, "Remote logout failed"),
            }
        }))
    }

    /// Forward a user-activity signal. Ignored while logged out.
    pub fn record_activity(&self, signal: ActivitySignal) {
        if let Some(ref watchdog) = self.watchdog {
            watchdog.record(signal);
        }
    }

    /// Log out if the idle timer elapsed. Returns true when it did.
    pub fn check_idle(&mut self) -> bool {
        let expired = self.watchdog.as_mut().is_some_and(|w| w.has_expired());
        if expired {
            info!(timeout_secs = self.idle_timeout.as_secs(), "Session expired after inactivity");
            self.logout();
        }
        expired
    }

    fn arm_watchdog(&mut self) {
        // Replacing the old watchdog drops it, which cancels its timer.
        self.watchdog = Some(IdleWatchdog::start(self.idle_timeout));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::credential::credential_for;
    use crate::auth::storage::{CredentialStorage, MemoryStorage, StoredCredential};
    use crate::auth::watchdog::IDLE_TIMEOUT;
    use crate::navigator::RecordingNavigator;

    const MINUTE: Duration = Duration::from_secs(60);

    #[derive(Default)]
    struct ScriptedAuth {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthService for ScriptedAuth {
        async fn logout(&self, _credential: &Credential) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }
    }

    struct Harness {
        controller: SessionController,
        storage: MemoryStorage,
        nav: RecordingNavigator,
        auth: Arc<ScriptedAuth>,
    }

    fn harness(fail_remote: bool) -> Harness {
        let storage = MemoryStorage::new();
        let nav = RecordingNavigator::default();
        let auth = Arc::new(ScriptedAuth {
            fail: fail_remote,
            ..Default::default()
        });
        let controller = SessionController::new(
            SessionStore::new(Box::new(storage.clone())),
            auth.clone(),
            Arc::new(nav.clone()),
            IDLE_TIMEOUT,
        );
        Harness {
            controller,
            storage,
            nav,
            auth,
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(d: Duration) {
        tokio::time::advance(d).await;
        settle().await;
    }

    #[tokio::test]
    async fn test_login_sets_session_and_navigates() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::Administrator));

        assert!(h.controller.is_authenticated());
        assert_eq!(h.controller.role(), Some(Role::Administrator));
        assert!(h.controller.watchdog_armed());
        assert!(h.storage.contains_key());
        assert_eq!(h.nav.calls(), vec!["/dashboard".to_string()]);
    }

    #[tokio::test]
    async fn test_restore_arms_watchdog() {
        let mut h = harness(false);
        h.storage
            .store(&StoredCredential::new(credential_for(Role::SalesPerson).as_str()))
            .unwrap();

        assert!(h.controller.restore());
        assert_eq!(h.controller.role(), Some(Role::SalesPerson));
        assert!(h.controller.watchdog_armed());
        assert!(h.nav.calls().is_empty());
    }

    #[tokio::test]
    async fn test_restore_without_credential_stays_logged_out() {
        let mut h = harness(false);
        assert!(!h.controller.restore());
        assert!(!h.controller.watchdog_armed());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::Administrator));

        let remote = h.controller.logout().expect("remote call spawned");
        remote.await.unwrap();

        assert!(!h.controller.is_authenticated());
        assert!(h.controller.session().credential.is_none());
        assert!(!h.controller.watchdog_armed());
        assert!(!h.storage.contains_key());
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.nav.calls().last().map(String::as_str), Some("/login"));
    }

    #[tokio::test]
    async fn test_logout_with_failing_remote_still_logs_out() {
        let mut h = harness(true);
        h.controller.login(credential_for(Role::SalesPerson));

        let remote = h.controller.logout().expect("remote call spawned");
        // The local effect is already visible before the remote call ends.
        assert!(h.controller.session().credential.is_none());
        assert!(!h.storage.contains_key());
        assert_eq!(h.nav.calls().last().map(String::as_str), Some("/login"));

        remote.await.unwrap();
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
        assert!(h.controller.session().credential.is_none());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::Administrator));

        if let Some(remote) = h.controller.logout() {
            remote.await.unwrap();
        }
        assert!(h.controller.logout().is_none());

        assert!(!h.controller.is_authenticated());
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.nav.calls(), vec!["/dashboard", "/login", "/login"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_with_activity() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::Administrator));
        h.controller.record_activity(ActivitySignal::PointerMove);
        settle().await;

        advance(10 * MINUTE).await;
        h.controller.record_activity(ActivitySignal::KeyPress);
        settle().await;

        advance(25 * MINUTE).await;
        assert!(!h.controller.check_idle());
        assert!(h.controller.is_authenticated());

        advance(6 * MINUTE).await;
        assert!(h.controller.check_idle());
        assert!(!h.controller.is_authenticated());
        assert!(!h.storage.contains_key());
        assert_eq!(h.nav.calls().last().map(String::as_str), Some("/login"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_watchdog() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::Administrator));
        h.controller.logout();

        advance(31 * MINUTE).await;
        assert!(!h.controller.check_idle());
        assert_eq!(h.nav.calls(), vec!["/dashboard", "/login"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_while_logged_out_is_ignored() {
        let mut h = harness(false);
        h.controller.record_activity(ActivitySignal::Click);
        advance(31 * MINUTE).await;
        assert!(!h.controller.check_idle());
        assert!(h.nav.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_replaces_watchdog() {
        let mut h = harness(false);
        h.controller.login(credential_for(Role::SalesPerson));
        advance(20 * MINUTE).await;

        h.controller.login(credential_for(Role::Administrator));
        advance(15 * MINUTE).await;
        assert!(!h.controller.check_idle(), "first timer must not fire at t=30");

        advance(16 * MINUTE).await;
        assert!(h.controller.check_idle());
    }
}
