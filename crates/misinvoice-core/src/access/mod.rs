//! Route authorization for protected views.
//!
//! - `gate`: the pending/allowed/denied decision and its per-mount state machine
//! - `view`: a mounted protected page with its cancellable denial redirect
//! - `nav`: role-filtered navigation entries shared by the title bar and drawer

pub mod gate;
pub mod nav;
pub mod view;

pub use gate::{decide, Decision, RoleGate};
pub use nav::{filter, Icon, NavigationEntry, NAV_ENTRIES};
pub use view::{
    ProtectedView, ViewState, ACCESS_DENIED_MESSAGE, ACCESS_DENIED_TITLE, DENIAL_REDIRECT_DELAY,
};
