//! Application state management for the MIS & Invoicing console.
//!
//! This module contains the `App` struct that owns the session controller,
//! the current page (public form or protected view), fetched listings, and
//! background task coordination.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use misinvoice_core::access::{
    filter, NavigationEntry, ProtectedView, ViewState, DENIAL_REDIRECT_DELAY, NAV_ENTRIES,
};
use misinvoice_core::auth::{ActivitySignal, AuthService, CredentialStorage, IDLE_TIMEOUT};
use misinvoice_core::models::{ResourceKind, ResourceTable};
use misinvoice_core::routes::{guard, GuardOutcome, Route};
use misinvoice_core::{
    ApiClient, ApiError, ChannelNavigator, Config, Credential, Navigator, Role,
    SessionController, SessionState, SessionStore,
};

use crate::forms::{FieldKind, Form};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Which panel receives list keys while signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Drawer,
    Content,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned fetches. Each carries the session
/// generation it was started under, so a reply that outlives its session
/// is dropped.
enum TaskResult {
    Table(u64, ResourceKind, ResourceTable),
    FetchFailed(u64, ResourceKind, String),
    /// The backend rejected the credential
    Unauthorized(u64),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    config_file: Option<PathBuf>,
    pub api: ApiClient,
    pub controller: SessionController,
    navigator: Arc<dyn Navigator>,
    nav_rx: mpsc::UnboundedReceiver<String>,

    // UI state
    pub state: AppState,
    pub focus: Focus,
    pub current_route: Route,
    current_path: String,
    pub view: Option<ProtectedView>,
    pub form: Option<Form>,
    pub drawer_selection: usize,
    pub table_selection: usize,
    pub status_message: Option<String>,

    // Fetched listings
    pub tables: HashMap<ResourceKind, ResourceTable>,
    pub loading: Option<ResourceKind>,

    // Bumped on every login and logout
    generation: u64,
    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,
}

impl App {
    /// Create the application from a loaded config. Must be called from
    /// within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url)?;
        info!(api = api.base_url(), backend = ?config.credential_backend, "Backend configured");
        let storage = config.build_storage()?;
        let auth: Arc<dyn AuthService> = Arc::new(api.clone());
        let config_file = match Config::path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "No config directory, settings will not be saved");
                None
            }
        };
        Ok(Self::from_parts(config, config_file, api, auth, storage))
    }

    fn from_parts(
        config: Config,
        config_file: Option<PathBuf>,
        api: ApiClient,
        auth: Arc<dyn AuthService>,
        storage: Box<dyn CredentialStorage>,
    ) -> Self {
        let (navigator, nav_rx) = ChannelNavigator::new();
        let navigator: Arc<dyn Navigator> = Arc::new(navigator);
        let controller = SessionController::new(
            SessionStore::new(storage),
            auth,
            Arc::clone(&navigator),
            IDLE_TIMEOUT,
        );
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            config_file,
            api,
            controller,
            navigator,
            nav_rx,

            state: AppState::Normal,
            focus: Focus::Content,
            current_route: Route::Root,
            current_path: String::new(),
            view: None,
            form: None,
            drawer_selection: 0,
            table_selection: 0,
            status_message: None,

            tables: HashMap::new(),
            loading: None,

            generation: 0,
            task_tx,
            task_rx,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Restore a persisted session and open the landing page. The guard
    /// sends anyone without a usable session to the login form.
    pub fn start(&mut self) {
        if self.controller.restore() {
            self.sync_token();
        }
        self.navigate(Route::LANDING.path());
    }

    pub fn session(&self) -> &SessionState {
        self.controller.session()
    }

    pub fn role(&self) -> Option<Role> {
        self.controller.role()
    }

    fn sync_token(&mut self) {
        let token = self.session().credential.as_ref().map(|c| c.as_str().to_string());
        self.api.set_token(token);
    }

    /// Forward a user-activity signal to the idle watchdog.
    pub fn record_activity(&self, signal: ActivitySignal) {
        self.controller.record_activity(signal);
    }

    /// Accept a credential from the login endpoint. A token without a
    /// recognised role would only ever reach the access-denied page, so it
    /// is refused here.
    pub fn complete_login(&mut self, email: &str, credential: Credential) -> Result<(), String> {
        if credential.role().is_none() {
            warn!("Login refused, credential carries no recognised role");
            return Err("This account has no access role assigned".to_string());
        }

        self.generation += 1;
        self.tables.clear();
        self.loading = None;
        self.config.last_email = Some(email.to_string());
        if let Some(ref path) = self.config_file {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }

        self.controller.login(credential);
        self.sync_token();
        self.status_message = None;
        info!(role = ?self.role(), "Login successful");
        Ok(())
    }

    pub fn logout(&mut self) {
        // The remote call runs detached; its failure is logged by the controller.
        let _ = self.controller.logout();
        self.after_logout(None);
    }

    fn after_logout(&mut self, message: Option<&str>) {
        self.generation += 1;
        self.api.set_token(None);
        self.tables.clear();
        self.loading = None;
        self.focus = Focus::Content;
        self.status_message = message.map(str::to_string);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to `path`, applying the route guard.
    pub fn navigate(&mut self, path: &str) {
        match guard(path, self.controller.session()) {
            GuardOutcome::Render(route) => self.enter(route, path),
            GuardOutcome::Redirect(route) => {
                debug!(from = path, to = route.path(), "Route guard redirect");
                self.enter(route, route.path());
            }
        }
    }

    fn enter(&mut self, route: Route, path: &str) {
        if route == self.current_route && path == self.current_path {
            return;
        }

        // Unmounting the old view cancels its pending denial redirect.
        self.view = None;
        self.form = None;
        self.current_route = route;
        self.current_path = path.to_string();
        self.table_selection = 0;

        if route.is_protected() {
            self.view = Some(ProtectedView::mount(
                route,
                Arc::clone(&self.navigator),
                DENIAL_REDIRECT_DELAY,
            ));
            if let Some(i) = self.nav_entries().iter().position(|e| e.route == route) {
                self.drawer_selection = i;
            }
        } else {
            self.focus = Focus::Content;
            self.form = Form::for_route(route, path, self.config.last_email.as_deref());
        }
        info!(path, "Navigated");
    }

    /// Apply navigation requested by the controller and denial timers.
    pub fn process_navigation(&mut self) {
        while let Ok(path) = self.nav_rx.try_recv() {
            self.navigate(&path);
        }
    }

    /// Run the mounted view's role gate. Listing pages start their fetch
    /// the first time they are allowed.
    pub fn check_access(&mut self) {
        let role = self.role();
        let Some(view) = self.view.as_mut() else {
            return;
        };

        let before = view.state();
        let after = view.check(role);
        if before == ViewState::Content || after != ViewState::Content {
            return;
        }
        if let Some(kind) = ResourceKind::for_route(view.route()) {
            if !self.tables.contains_key(&kind) {
                self.fetch_resource(kind);
            }
        }
    }

    pub fn view_state(&self) -> Option<ViewState> {
        self.view.as_ref().map(ProtectedView::state)
    }

    /// Drawer entries for the current role.
    pub fn nav_entries(&self) -> Vec<&'static NavigationEntry> {
        filter(self.role(), &NAV_ENTRIES)
    }

    pub fn open_nav_entry(&mut self, index: usize) {
        if let Some(entry) = self.nav_entries().get(index) {
            self.drawer_selection = index;
            self.navigate(entry.route.path());
        }
    }

    /// One main-loop step after input handling.
    pub fn tick(&mut self) {
        self.check_background_tasks();
        if self.controller.check_idle() {
            self.after_logout(Some("Session expired after 30 minutes of inactivity"));
        }
        self.process_navigation();
        self.check_access();
    }

    // =========================================================================
    // Listings
    // =========================================================================

    pub fn current_table(&self) -> Option<&ResourceTable> {
        ResourceKind::for_route(self.current_route).and_then(|kind| self.tables.get(&kind))
    }

    /// Fetch a listing in the background
    pub fn fetch_resource(&mut self, kind: ResourceKind) {
        let tx = self.task_tx.clone();
        let api = self.api.clone();
        let generation = self.generation;
        self.loading = Some(kind);
        self.status_message = Some(format!("Loading {}...", kind.route().title()));

        tokio::spawn(async move {
            let result = match api.fetch_table(kind).await {
                Ok(table) => TaskResult::Table(generation, kind, table),
                Err(e) if ApiError::is_unauthorized(&e) => TaskResult::Unauthorized(generation),
                Err(e) => {
                    error!(error = %e, endpoint = kind.endpoint(), "Fetch failed");
                    TaskResult::FetchFailed(generation, kind, e.root_cause().to_string())
                }
            };
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send fetch result - channel closed");
            }
        });
    }

    /// Refetch the listing on the current page, if it is one and is shown.
    pub fn refresh_current(&mut self) {
        if self.view_state() != Some(ViewState::Content) {
            return;
        }
        if let Some(kind) = ResourceKind::for_route(self.current_route) {
            self.fetch_resource(kind);
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        let generation = match &result {
            TaskResult::Table(g, ..) | TaskResult::FetchFailed(g, ..) | TaskResult::Unauthorized(g) => *g,
        };
        if generation != self.generation {
            debug!("Dropping result from an ended session");
            return;
        }

        match result {
            TaskResult::Table(_, kind, table) => {
                debug!(endpoint = kind.endpoint(), rows = table.len(), "Listing loaded");
                self.tables.insert(kind, table);
                if self.loading == Some(kind) {
                    self.loading = None;
                    self.status_message = None;
                }
                self.clamp_table_selection();
            }
            TaskResult::FetchFailed(_, kind, message) => {
                if self.loading == Some(kind) {
                    self.loading = None;
                }
                self.status_message = Some(format!("Failed to load {}: {}", kind.route().title(), message));
            }
            TaskResult::Unauthorized(_) => {
                warn!("Backend rejected the credential, logging out");
                let _ = self.controller.logout();
                self.after_logout(Some("Session is no longer valid. Please log in again."));
            }
        }
    }

    pub fn select_row(&mut self, delta: isize) {
        let len = self.current_table().map(ResourceTable::len).unwrap_or(0);
        if len == 0 {
            self.table_selection = 0;
            return;
        }
        let max = len - 1;
        self.table_selection = if delta < 0 {
            self.table_selection.saturating_sub(delta.unsigned_abs())
        } else {
            self.table_selection.saturating_add(delta as usize).min(max)
        };
    }

    fn clamp_table_selection(&mut self) {
        let len = self.current_table().map(ResourceTable::len).unwrap_or(0);
        self.table_selection = self.table_selection.min(len.saturating_sub(1));
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Submit the form on the current public page.
    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if let Err(message) = form.validate() {
            form.error = Some(message);
            return;
        }
        form.error = None;
        form.notice = None;
        let form = form.clone();

        if form.route == Route::Login {
            self.attempt_login(&form).await;
            return;
        }

        let result = match form.route {
            Route::Register => {
                let role = form.role.unwrap_or(Role::SalesPerson);
                self.api
                    .register(form.value(FieldKind::Name), form.value(FieldKind::Email), form.secret(FieldKind::Password), role)
                    .await
            }
            Route::ForgotPassword => self.api.forgot_password(form.value(FieldKind::Email)).await,
            Route::ResetPassword => {
                self.api
                    .reset_password(form.value(FieldKind::Token), form.secret(FieldKind::NewPassword))
                    .await
            }
            Route::VerifyEmail => self.api.verify_email(form.value(FieldKind::Token)).await,
            Route::ResendVerification => self.api.resend_verification(form.value(FieldKind::Email)).await,
            _ => return,
        };

        let Some(current) = self.form.as_mut().filter(|f| f.route == form.route) else {
            return;
        };
        match result {
            Ok(message) => {
                info!(route = form.route.path(), "Form submitted");
                current.clear_secrets();
                current.notice = Some(message.unwrap_or_else(|| success_message(form.route).to_string()));
            }
            Err(e) => {
                error!(error = %e, route = form.route.path(), "Form submission failed");
                current.error = Some(user_message(&e, "Request rejected, please sign in again"));
            }
        }
    }

    async fn attempt_login(&mut self, form: &Form) {
        let email = form.value(FieldKind::Email).to_string();
        let outcome = match self.api.authenticate(&email, form.secret(FieldKind::Password)).await {
            Ok(credential) => self.complete_login(&email, credential),
            Err(e) => {
                error!(error = %e, "Login failed");
                Err(user_message(&e, "Invalid email or password"))
            }
        };

        if let Err(message) = outcome {
            if let Some(current) = self.form.as_mut() {
                current.clear_secrets();
                current.error = Some(message);
            }
        }
    }
}

fn success_message(route: Route) -> &'static str {
    match route {
        Route::Register => "Registration successful. Check your email to verify your account.",
        Route::ForgotPassword => "If the account exists, a reset link has been sent.",
        Route::ResetPassword => "Password reset. You can now log in.",
        Route::VerifyEmail => "Email verified. You can now log in.",
        _ => "Verification email sent.",
    }
}

/// User-facing text for a failed request.
fn user_message(e: &anyhow::Error, unauthorized: &str) -> String {
    if ApiError::is_unauthorized(e) {
        return unauthorized.to_string();
    }
    let full = format!("{:#}", e).to_lowercase();
    if full.contains("timed out") || full.contains("timeout") {
        "Connection timed out. Please try again.".to_string()
    } else if full.contains("connect") || full.contains("network") {
        "Unable to connect to server. Check that the backend is reachable.".to_string()
    } else {
        e.root_cause().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
