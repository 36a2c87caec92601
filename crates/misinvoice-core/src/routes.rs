//! Path table and the route-level authentication guard.
//!
//! The guard only answers "may an anonymous user be here?". Role checks
//! belong to [`crate::access::ProtectedView`], which needs its pending and
//! denied states.

use crate::auth::{Role, SessionState};

const ADMIN_ONLY: &[Role] = &[Role::Administrator];
const ALL_ROLES: &[Role] = &Role::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    VerifyEmail,
    ResendVerification,
    Dashboard,
    EmployeeManagement,
    Payroll,
    TimeAttendance,
    Reports,
    Chains,
    Brands,
    Groups,
    SubZones,
    Estimates,
    Invoices,
}

/// Who may render a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(&'static [Role]),
}

impl Route {
    /// Default authenticated landing page, also the denial redirect target.
    pub const LANDING: Route = Route::Dashboard;

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::ResetPassword => "/reset-password",
            Route::VerifyEmail => "/verify-email",
            Route::ResendVerification => "/resend-verification",
            Route::Dashboard => "/dashboard",
            Route::EmployeeManagement => "/employee-management",
            Route::Payroll => "/payroll",
            Route::TimeAttendance => "/time-attendance",
            Route::Reports => "/reports",
            Route::Chains => "/chains",
            Route::Brands => "/brands",
            Route::Groups => "/groups",
            Route::SubZones => "/sub-zones",
            Route::Estimates => "/estimates",
            Route::Invoices => "/invoices",
        }
    }

    /// Match a path, ignoring any query string and trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split('?').next().unwrap_or(path);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        let route = match path {
            "/" => Route::Root,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            "/reset-password" => Route::ResetPassword,
            // The verification e-mail links to the API path.
            "/verify-email" | "/api/verify" => Route::VerifyEmail,
            "/resend-verification" => Route::ResendVerification,
            "/dashboard" => Route::Dashboard,
            "/employee-management" => Route::EmployeeManagement,
            "/payroll" => Route::Payroll,
            "/time-attendance" => Route::TimeAttendance,
            "/reports" => Route::Reports,
            "/chains" => Route::Chains,
            "/brands" => Route::Brands,
            "/groups" => Route::Groups,
            "/sub-zones" => Route::SubZones,
            "/estimates" => Route::Estimates,
            "/invoices" => Route::Invoices,
            _ => return None,
        };
        Some(route)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Root | Route::Login => "Login",
            Route::Register => "Register",
            Route::ForgotPassword => "Forgot Password",
            Route::ResetPassword => "Reset Password",
            Route::VerifyEmail => "Verify Email",
            Route::ResendVerification => "Resend Verification",
            Route::Dashboard => "Dashboard",
            Route::EmployeeManagement => "Employee Management",
            Route::Payroll => "Payroll",
            Route::TimeAttendance => "Time & Attendance",
            Route::Reports => "Reports",
            Route::Chains => "Chains",
            Route::Brands => "Brands",
            Route::Groups => "Groups",
            Route::SubZones => "Sub-Zones",
            Route::Estimates => "Estimates",
            Route::Invoices => "Invoices",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Root
            | Route::Login
            | Route::Register
            | Route::ForgotPassword
            | Route::ResetPassword
            | Route::VerifyEmail
            | Route::ResendVerification => Access::Public,
            Route::Dashboard | Route::TimeAttendance | Route::Reports | Route::Invoices => {
                Access::Roles(ALL_ROLES)
            }
            Route::EmployeeManagement
            | Route::Payroll
            | Route::Chains
            | Route::Brands
            | Route::Groups
            | Route::SubZones
            | Route::Estimates => Access::Roles(ADMIN_ONLY),
        }
    }

    /// Roles allowed to see the route; empty for public routes.
    pub fn required_roles(&self) -> &'static [Role] {
        match self.access() {
            Access::Public => &[],
            Access::Roles(roles) => roles,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self.access(), Access::Roles(_))
    }
}

/// Value of `key` in the path's query string.
pub fn query_param<'a>(path: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = path.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Render(Route),
    Redirect(Route),
}

/// Decide what a navigation to `path` renders.
///
/// Unknown paths and `/` go to the login page. Protected routes require a
/// credential. The landing page additionally requires a role: sending a
/// role-less session to the access-denied view would redirect it back to
/// the landing page forever.
pub fn guard(path: &str, session: &SessionState) -> GuardOutcome {
    let route = match Route::from_path(path) {
        Some(Route::Root) | None => return GuardOutcome::Redirect(Route::Login),
        Some(route) => route,
    };

    if route.is_protected() && !session.is_authenticated() {
        return GuardOutcome::Redirect(Route::Login);
    }
    if route == Route::LANDING && session.role.is_none() {
        return GuardOutcome::Redirect(Route::Login);
    }
    GuardOutcome::Render(route)
}
