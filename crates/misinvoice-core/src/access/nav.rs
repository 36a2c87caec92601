use crate::auth::Role;
use crate::routes::Route;

const ADMIN: &[Role] = &[Role::Administrator];
const EVERYONE: &[Role] = &[Role::Administrator, Role::SalesPerson];

/// Icon reference; the front end maps it to a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Dashboard,
    People,
    Money,
    Schedule,
    Report,
    Store,
    Label,
    Group,
    Map,
    Calculate,
    Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    pub label: &'static str,
    pub icon: Icon,
    pub route: Route,
    pub roles: &'static [Role],
}

impl NavigationEntry {
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Every navigation entry, in display order.
pub static NAV_ENTRIES: [NavigationEntry; 11] = [
    NavigationEntry { label: "Dashboard", icon: Icon::Dashboard, route: Route::Dashboard, roles: EVERYONE },
    NavigationEntry { label: "Employee Management", icon: Icon::People, route: Route::EmployeeManagement, roles: ADMIN },
    NavigationEntry { label: "Payroll", icon: Icon::Money, route: Route::Payroll, roles: ADMIN },
    NavigationEntry { label: "Time & Attendance", icon: Icon::Schedule, route: Route::TimeAttendance, roles: EVERYONE },
    NavigationEntry { label: "Reports", icon: Icon::Report, route: Route::Reports, roles: EVERYONE },
    NavigationEntry { label: "Chains", icon: Icon::Store, route: Route::Chains, roles: ADMIN },
    NavigationEntry { label: "Brands", icon: Icon::Label, route: Route::Brands, roles: ADMIN },
    NavigationEntry { label: "Groups", icon: Icon::Group, route: Route::Groups, roles: ADMIN },
    NavigationEntry { label: "Sub-Zones", icon: Icon::Map, route: Route::SubZones, roles: ADMIN },
    NavigationEntry { label: "Estimates", icon: Icon::Calculate, route: Route::Estimates, roles: ADMIN },
    NavigationEntry { label: "Invoices", icon: Icon::Receipt, route: Route::Invoices, roles: EVERYONE },
];

/// Entries visible to `role`, order preserved. No role, no entries.
pub fn filter(role: Option<Role>, entries: &[NavigationEntry]) -> Vec<&NavigationEntry> {
    match role {
        Some(role) => entries.iter().filter(|e| e.permits(role)).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[&NavigationEntry]) -> Vec<&'static str> {
        entries.iter().map(|e| e.label).collect()
    }

    #[test]
    fn test_no_role_sees_nothing() {
        assert!(filter(None, &NAV_ENTRIES).is_empty());
    }

    #[test]
    fn test_admin_sees_everything_in_order() {
        let visible = filter(Some(Role::Administrator), &NAV_ENTRIES);
        let all: Vec<&NavigationEntry> = NAV_ENTRIES.iter().collect();
        assert_eq!(visible, all);
    }

    #[test]
    fn test_sales_person_entries() {
        let visible = filter(Some(Role::SalesPerson), &NAV_ENTRIES);
        assert_eq!(
            labels(&visible),
            vec!["Dashboard", "Time & Attendance", "Reports", "Invoices"]
        );
    }

    #[test]
    fn test_filter_preserves_input_order() {
        let reversed: Vec<NavigationEntry> = NAV_ENTRIES.iter().rev().cloned().collect();
        for role in Role::ALL {
            let visible = filter(Some(role), &reversed);
            let positions: Vec<usize> = visible
                .iter()
                .map(|v| reversed.iter().position(|e| e == *v).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_entries_match_route_access() {
        for entry in &NAV_ENTRIES {
            assert_eq!(entry.roles, entry.route.required_roles(), "{}", entry.label);
            assert!(entry.route.is_protected());
        }
    }

    #[test]
    fn test_empty_entry_list() {
        assert!(filter(Some(Role::Administrator), &[]).is_empty());
    }
}
