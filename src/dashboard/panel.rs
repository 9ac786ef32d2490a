//! Panel definitions.
//!
//! A panel is one self-contained query+render unit occupying a fixed
//! dashboard slot: a query built from the shared date range, plus a
//! display mode describing what to do with the materialized table.

use serde::Serialize;

use crate::chart::ChartSpec;
use crate::sql::Query;

/// Dashboard slot a panel occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// The three headline metrics.
    Top,
    /// The two side-by-side mid-page charts.
    Middle,
    /// Full-width charts below.
    Bottom,
}

/// The query behind a panel: literal SQL text with the date bounds already
/// interpolated, or a composed query.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelQuery {
    Sql(String),
    Composed(Query),
}

impl PanelQuery {
    /// The SQL text this panel will execute.
    pub fn to_sql(&self) -> String {
        match self {
            PanelQuery::Sql(sql) => sql.clone(),
            PanelQuery::Composed(query) => query.to_sql(),
        }
    }
}

/// How a panel's result is displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Display {
    /// A single labeled number, formatted with thousands separators and
    /// the given number of decimals.
    Metric { decimals: usize },
    /// A chart driven by the result table.
    Chart { spec: ChartSpec },
    /// A chart plus the raw table listed alongside it.
    ChartWithListing { spec: ChartSpec },
}

/// One dashboard panel.
#[derive(Debug, Clone)]
pub struct Panel {
    /// Stable machine-readable identifier.
    pub slug: &'static str,
    /// Heading shown above the panel.
    pub title: &'static str,
    /// Slot in the dashboard layout.
    pub region: Region,
    /// The query to execute.
    pub query: PanelQuery,
    /// What to do with the result.
    pub display: Display,
}

impl Panel {
    /// The SQL text this panel will execute.
    pub fn sql(&self) -> String {
        self.query.to_sql()
    }
}
