use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::gate::{Decision, RoleGate};
use crate::auth::Role;
use crate::navigator::Navigator;
use crate::routes::Route;

/// How long the denial message stays up before redirecting.
pub const DENIAL_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

pub const ACCESS_DENIED_TITLE: &str = "Access Denied";
pub const ACCESS_DENIED_MESSAGE: &str =
    "You do not have permission to access this page. Redirecting to dashboard...";

/// The three mutually exclusive renderings of a protected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    AccessDenied,
    Content,
}

impl From<Decision> for ViewState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Pending => ViewState::Loading,
            Decision::Denied => ViewState::AccessDenied,
            Decision::Allowed => ViewState::Content,
        }
    }
}

/// A mounted protected page.
///
/// Owns the denial redirect: dropping the view (unmounting) cancels it.
pub struct ProtectedView {
    route: Route,
    gate: RoleGate,
    navigator: Arc<dyn Navigator>,
    delay: Duration,
    redirect: Option<JoinHandle<()>>,
}

impl ProtectedView {
    pub fn mount(route: Route, navigator: Arc<dyn Navigator>, delay: Duration) -> Self {
        debug!(route = route.path(), "Mounting protected view");
        Self {
            route,
            gate: RoleGate::new(route.required_roles()),
            navigator,
            delay,
            redirect: None,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn state(&self) -> ViewState {
        self.gate.decision().into()
    }

    /// Run the gate against the session role. On the transition to
    /// denied, schedules the redirect to the landing page. Must be called
    /// from within a tokio runtime.
    pub fn check(&mut self, role: Option<Role>) -> ViewState {
        let before = self.gate.decision();
        let after = self.gate.check(role);

        if before == Decision::Pending && after == Decision::Denied {
            info!(route = self.route.path(), ?role, "Access denied");
            self.schedule_redirect();
        }
        after.into()
    }

    /// Whether a denial redirect is still waiting to fire.
    pub fn redirect_pending(&self) -> bool {
        self.redirect.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn schedule_redirect(&mut self) {
        let deadline = Instant::now() + self.delay;
        let navigator = Arc::clone(&self.navigator);
        self.redirect = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            navigator.navigate(Route::LANDING.path());
        }));
    }
}

impl Drop for ProtectedView {
    fn drop(&mut self) {
        if let Some(handle) = self.redirect.take() {
            if !handle.is_finished() {
                debug!(route = self.route.path(), "Cancelling denial redirect");
            }
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::RecordingNavigator;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn mount(route: Route, nav: &RecordingNavigator) -> ProtectedView {
        ProtectedView::mount(route, Arc::new(nav.clone()), DENIAL_REDIRECT_DELAY)
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_loading_without_side_effects() {
        let nav = RecordingNavigator::default();
        let view = mount(Route::Payroll, &nav);
        assert_eq!(view.state(), ViewState::Loading);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(nav.calls().is_empty());
        assert!(!view.redirect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowed_renders_content() {
        let nav = RecordingNavigator::default();
        let mut view = mount(Route::Payroll, &nav);
        assert_eq!(view.check(Some(Role::Administrator)), ViewState::Content);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(nav.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_redirects_once_at_exact_delay() {
        let nav = RecordingNavigator::default();
        let mut view = mount(Route::EmployeeManagement, &nav);

        assert_eq!(view.check(Some(Role::SalesPerson)), ViewState::AccessDenied);
        assert!(view.redirect_pending());

        tokio::time::advance(Duration::from_millis(1999)).await;
        settle().await;
        assert!(nav.calls().is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(nav.calls(), vec!["/dashboard".to_string()]);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(nav.calls().len(), 1);
        assert!(!view.redirect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_checks_schedule_one_redirect() {
        let nav = RecordingNavigator::default();
        let mut view = mount(Route::Payroll, &nav);
        view.check(Some(Role::SalesPerson));
        view.check(Some(Role::SalesPerson));
        view.check(Some(Role::Administrator));
        assert_eq!(view.state(), ViewState::AccessDenied);

        tokio::time::advance(DENIAL_REDIRECT_DELAY).await;
        settle().await;
        assert_eq!(nav.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_before_delay_cancels_redirect() {
        let nav = RecordingNavigator::default();
        let mut view = mount(Route::Payroll, &nav);
        view.check(Some(Role::SalesPerson));
        settle().await;

        tokio::time::advance(Duration::from_millis(500)).await;
        drop(view);

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(nav.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_role_is_denied() {
        let nav = RecordingNavigator::default();
        let mut view = mount(Route::Reports, &nav);
        assert_eq!(view.check(None), ViewState::AccessDenied);
    }
}
