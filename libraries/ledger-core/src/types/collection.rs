use serde::{Deserialize, Serialize};
use std::fmt;

/// Named record collections held by the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    WorkOrders,
    Expenses,
    Settings,
    Stats,
}

impl Collection {
    /// Every collection, in the order `clear_all` empties them
    pub const ALL: [Collection; 5] = [
        Collection::WorkOrders,
        Collection::Expenses,
        Collection::Settings,
        Collection::Stats,
        Collection::Users,
    ];

    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::WorkOrders => "work_orders",
            Collection::Expenses => "expenses",
            Collection::Settings => "settings",
            Collection::Stats => "stats",
        }
    }

    /// Whether reads and writes on this collection are scoped to an owner
    pub fn is_owned(self) -> bool {
        matches!(self, Collection::WorkOrders | Collection::Expenses)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
