use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission level carried by a session.
///
/// The set is closed: adding a role is a compile-time-visible change to
/// every `match` over it (access gate, navigation, routes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Administrator,
    #[serde(rename = "ROLE_SALES_PERSON")]
    SalesPerson,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 2] = [Role::Administrator, Role::SalesPerson];

    /// Parse the authority name the backend puts in the token claims.
    /// Anything else is not a role.
    pub fn from_claim(value: &str) -> Option<Self> {
        match value {
            "ROLE_ADMIN" => Some(Role::Administrator),
            "ROLE_SALES_PERSON" => Some(Role::SalesPerson),
            _ => None,
        }
    }

    /// Authority name as sent to and received from the backend.
    pub fn claim_name(&self) -> &'static str {
        match self {
            Role::Administrator => "ROLE_ADMIN",
            Role::SalesPerson => "ROLE_SALES_PERSON",
        }
    }

    /// Get the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Administrator => "Admin",
            Role::SalesPerson => "Salesperson",
        }
    }

    /// Single-letter avatar shown in the side drawer.
    pub fn initial(&self) -> char {
        match self {
            Role::Administrator => 'A',
            Role::SalesPerson => 'S',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
