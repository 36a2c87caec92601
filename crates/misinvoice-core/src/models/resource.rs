use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::routes::Route;

/// A record that renders as one table row.
pub trait TableRow: DeserializeOwned {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chain {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Brand {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subzone {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Estimate {
    pub id: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

macro_rules! named_row {
    ($ty:ty) => {
        impl TableRow for $ty {
            const HEADERS: &'static [&'static str] = &["ID", "Name"];

            fn cells(&self) -> Vec<String> {
                vec![self.id.to_string(), text(&self.name)]
            }
        }
    };
}

named_row!(Chain);
named_row!(Brand);
named_row!(Group);
named_row!(Subzone);

impl TableRow for Estimate {
    const HEADERS: &'static [&'static str] = &["ID", "Amount", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), money(self.amount), text(&self.description)]
    }
}

impl TableRow for Invoice {
    const HEADERS: &'static [&'static str] = &["ID", "Amount", "Status"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), money(self.amount), text(&self.status)]
    }
}

/// Entity collections a management page can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Chains,
    Brands,
    Groups,
    SubZones,
    Estimates,
    Invoices,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Chains,
        ResourceKind::Brands,
        ResourceKind::Groups,
        ResourceKind::SubZones,
        ResourceKind::Estimates,
        ResourceKind::Invoices,
    ];

    /// Backend collection path
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::Chains => "/chains",
            ResourceKind::Brands => "/brands",
            ResourceKind::Groups => "/groups",
            ResourceKind::SubZones => "/subzones",
            ResourceKind::Estimates => "/estimates",
            ResourceKind::Invoices => "/invoices",
        }
    }

    pub fn route(&self) -> Route {
        match self {
            ResourceKind::Chains => Route::Chains,
            ResourceKind::Brands => Route::Brands,
            ResourceKind::Groups => Route::Groups,
            ResourceKind::SubZones => Route::SubZones,
            ResourceKind::Estimates => Route::Estimates,
            ResourceKind::Invoices => Route::Invoices,
        }
    }

    /// The collection a page lists, if it is a listing page.
    pub fn for_route(route: Route) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.route() == route)
    }
}

/// Rendered listing of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl ResourceTable {
    pub fn from_records<T: TableRow>(records: &[T]) -> Self {
        Self {
            headers: T::HEADERS,
            rows: records.iter().map(TableRow::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ignores_nested_relations() {
        let json = r#"[{"id":1,"name":"Acme","clients":[],"groups":[{"id":4}],"brands":null}]"#;
        let chains: Vec<Chain> = serde_json::from_str(json).unwrap();
        let table = ResourceTable::from_records(&chains);
        assert_eq!(table.headers, &["ID", "Name"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "Acme".to_string()]]);
    }

    #[test]
    fn test_invoice_cells() {
        let json = r#"[{"id":7,"amount":1250.5,"status":"PAID"},{"id":8}]"#;
        let invoices: Vec<Invoice> = serde_json::from_str(json).unwrap();
        let table = ResourceTable::from_records(&invoices);
        assert_eq!(table.rows[0], vec!["7", "1250.50", "PAID"]);
        assert_eq!(table.rows[1], vec!["8", "-", "-"]);
    }

    #[test]
    fn test_estimate_cells() {
        let estimate = Estimate { id: 3, amount: Some(99.999), description: Some("Signage".into()) };
        assert_eq!(estimate.cells(), vec!["3", "100.00", "Signage"]);
    }

    #[test]
    fn test_kind_route_mapping() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::for_route(kind.route()), Some(kind));
        }
        assert_eq!(ResourceKind::for_route(Route::Dashboard), None);
        assert_eq!(ResourceKind::for_route(Route::Payroll), None);
    }
}
