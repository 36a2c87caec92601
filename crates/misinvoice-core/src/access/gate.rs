use crate::auth::Role;

/// Outcome of a route-authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The session has not been read yet
    Pending,
    Allowed,
    /// A normal outcome: show the denial and redirect
    Denied,
}

impl Decision {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Decision::Pending)
    }
}

/// `None` means the role is not known yet.
pub fn decide(current: Option<Role>, required: &[Role]) -> Decision {
    match current {
        None => Decision::Pending,
        Some(role) if required.contains(&role) => Decision::Allowed,
        Some(_) => Decision::Denied,
    }
}

/// Per-mount gate state machine: Pending until the first check, then
/// Allowed or Denied for the rest of the mount.
#[derive(Debug, Clone)]
pub struct RoleGate {
    required: &'static [Role],
    decision: Decision,
}

impl RoleGate {
    pub fn new(required: &'static [Role]) -> Self {
        Self {
            required,
            decision: Decision::Pending,
        }
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Resolve the gate against the role read from the session. A session
    /// without a role (absent or malformed credential) is denied. Once
    /// resolved, later checks are ignored; a role change needs a new mount.
    pub fn check(&mut self, role: Option<Role>) -> Decision {
        if self.decision.is_terminal() {
            return self.decision;
        }
        self.decision = match role {
            Some(role) => decide(Some(role), self.required),
            None => Decision::Denied,
        };
        self.decision
    }
}
