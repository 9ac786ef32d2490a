//! Sequential panel execution.
//!
//! One render pass runs every catalogue panel in order against a shared
//! session and collects a per-panel outcome. A failing panel records its
//! error and the pass moves on; panels never abort each other.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::ChartSpec;
use crate::session::QuerySession;
use crate::table::{format_number, Table};

use super::catalog;
use super::date_range::DateRange;
use super::panel::{Display, Panel, Region};

/// The rendered form of one successful panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelView {
    /// A formatted headline number.
    Metric { value: String },
    /// A chart spec plus the table that feeds it.
    Chart { spec: ChartSpec, table: Table },
    /// A chart plus the table listed alongside it.
    ChartWithListing { spec: ChartSpec, table: Table },
}

/// Outcome of one panel in a render pass.
#[derive(Debug, Clone, Serialize)]
pub struct PanelReport {
    pub slug: &'static str,
    pub title: &'static str,
    pub region: Region,
    /// The view on success, the error text on failure.
    pub outcome: Result<PanelView, String>,
}

impl PanelReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The collected result of one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub range: DateRange,
    pub panels: Vec<PanelReport>,
}

impl DashboardReport {
    /// Number of panels that produced a view.
    pub fn succeeded(&self) -> usize {
        self.panels.iter().filter(|p| p.is_ok()).count()
    }

    /// Number of panels that recorded an error.
    pub fn failed(&self) -> usize {
        self.panels.len() - self.succeeded()
    }
}

/// Run every catalogue panel against `session`, in catalogue order.
pub async fn run(session: &dyn QuerySession, range: &DateRange) -> DashboardReport {
    let panels = catalog::panels(range);
    let mut reports = Vec::with_capacity(panels.len());

    for panel in panels {
        let sql = panel.sql();
        debug!(panel = panel.slug, sql = %sql, "executing panel query");

        let outcome = match session.execute(&sql).await {
            Ok(table) => {
                info!(panel = panel.slug, rows = table.row_count(), "panel ready");
                Ok(materialize(&panel, table))
            }
            Err(e) => {
                warn!(panel = panel.slug, error = %e, "panel failed");
                Err(e.to_string())
            }
        };

        reports.push(PanelReport {
            slug: panel.slug,
            title: panel.title,
            region: panel.region,
            outcome,
        });
    }

    DashboardReport {
        range: *range,
        panels: reports,
    }
}

/// Turn a materialized table into the panel's view.
///
/// A metric over an empty or NULL aggregate reads as zero: an account with
/// no activity in the range shows `0`, not an error.
fn materialize(panel: &Panel, table: Table) -> PanelView {
    match &panel.display {
        Display::Metric { decimals } => {
            let value = table.scalar_f64().unwrap_or(0.0);
            PanelView::Metric {
                value: format_number(value, *decimals),
            }
        }
        Display::Chart { spec } => PanelView::Chart {
            spec: spec.clone(),
            table,
        },
        Display::ChartWithListing { spec } => PanelView::ChartWithListing {
            spec: spec.clone(),
            table,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::panel::PanelQuery;
    use crate::table::{Column, Value};

    fn metric_panel(decimals: usize) -> Panel {
        Panel {
            slug: "test_metric",
            title: "Test Metric",
            region: Region::Top,
            query: PanelQuery::Sql("SELECT 1".into()),
            display: Display::Metric { decimals },
        }
    }

    fn scalar_table(value: Value) -> Table {
        Table::new(
            vec![Column {
                name: "CREDITS".into(),
                data_type: "FLOAT".into(),
            }],
            vec![vec![value]],
        )
    }

    #[test]
    fn test_metric_formats_scalar() {
        let view = materialize(&metric_panel(2), scalar_table(Value::Float(4.75)));
        assert_eq!(
            view,
            PanelView::Metric {
                value: "4.75".into()
            }
        );
    }

    #[test]
    fn test_null_aggregate_reads_as_zero() {
        let view = materialize(&metric_panel(0), scalar_table(Value::Null));
        assert_eq!(view, PanelView::Metric { value: "0".into() });
    }

    #[test]
    fn test_empty_result_reads_as_zero() {
        let empty = Table::new(
            vec![Column {
                name: "JOB_COUNT".into(),
                data_type: "NUMBER".into(),
            }],
            vec![],
        );
        let view = materialize(&metric_panel(0), empty);
        assert_eq!(view, PanelView::Metric { value: "0".into() });
    }

    #[test]
    fn test_metric_respects_decimals() {
        let view = materialize(&metric_panel(3), scalar_table(Value::Float(12.5)));
        assert_eq!(
            view,
            PanelView::Metric {
                value: "12.500".into()
            }
        );
    }
}
