//! Plain-text rendering for the terminal.

use std::io::{self, Write};

use crate::chart::ChartSpec;
use crate::dashboard::DashboardReport;
use crate::table::{Table, Value};

use super::{LayoutOptions, Renderer};

/// Cells wider than this are truncated with an ellipsis. Long QUERY_TEXT
/// values would otherwise swallow the page.
const MAX_CELL_WIDTH: usize = 60;

/// Rows printed per chart panel. The full table still appears for panels
/// that carry a listing.
const CHART_ROW_LIMIT: usize = 10;

/// Renders a report as aligned plain text.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The wrapped writer, for inspecting captured output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_table(&mut self, table: &Table, row_limit: Option<usize>) -> io::Result<()> {
        if table.is_empty() {
            return writeln!(self.out, "  (no rows)");
        }

        let shown = match row_limit {
            Some(limit) => limit.min(table.row_count()),
            None => table.row_count(),
        };

        let cells: Vec<Vec<String>> = table.rows()[..shown]
            .iter()
            .map(|row| row.iter().map(format_cell).collect())
            .collect();

        let widths: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(col.name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(self.out, "  ")?;
        for (col, width) in table.columns().iter().zip(&widths) {
            write!(self.out, "{:<width$}  ", col.name, width = width)?;
        }
        writeln!(self.out)?;

        write!(self.out, "  ")?;
        for width in &widths {
            write!(self.out, "{}  ", "-".repeat(*width))?;
        }
        writeln!(self.out)?;

        for row in &cells {
            write!(self.out, "  ")?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(self.out, "{:<width$}  ", cell, width = width)?;
            }
            writeln!(self.out)?;
        }

        if shown < table.row_count() {
            writeln!(self.out, "  ... {} more rows", table.row_count() - shown)?;
        }

        Ok(())
    }
}

fn format_cell(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > MAX_CELL_WIDTH {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX_CELL_WIDTH - 3)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn begin(&mut self, report: &DashboardReport) -> io::Result<()> {
        writeln!(self.out, "Snowflake Account Usage")?;
        writeln!(self.out, "Range: {}", report.range)?;
        writeln!(self.out)
    }

    fn metric(&mut self, title: &str, value: &str) -> io::Result<()> {
        writeln!(self.out, "{}: {}", title, value)
    }

    fn chart(
        &mut self,
        title: &str,
        _spec: &ChartSpec,
        table: &Table,
        layout: &LayoutOptions,
    ) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "## {}", title)?;
        let limit = if layout.full_width {
            None
        } else {
            Some(CHART_ROW_LIMIT)
        };
        self.write_table(table, limit)
    }

    fn listing(&mut self, table: &Table) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  ({} rows listed)", table.row_count())?;
        self.write_table(table, None)
    }

    fn warning(&mut self, title: &str, message: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "## {}", title)?;
        writeln!(self.out, "  warning: {}", message)
    }

    fn end(&mut self, report: &DashboardReport) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} of {} panels rendered",
            report.succeeded(),
            report.panels.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Channel, ChartSpec};
    use crate::dashboard::{DashboardReport, DateRange, PanelReport, PanelView, Region};
    use crate::table::Column;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new_as_of(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        )
        .unwrap()
    }

    fn rendered(report: &DashboardReport) -> String {
        let mut renderer = TextRenderer::new(Vec::new());
        crate::render::render(&mut renderer, report).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_metric_and_warning() {
        let report = DashboardReport {
            range: range(),
            panels: vec![
                PanelReport {
                    slug: "credits_used",
                    title: "Credits Used",
                    region: Region::Top,
                    outcome: Ok(PanelView::Metric {
                        value: "4.75".into(),
                    }),
                },
                PanelReport {
                    slug: "jobs_executed",
                    title: "Total # Jobs Executed",
                    region: Region::Top,
                    outcome: Err("query failed: timeout".into()),
                },
            ],
        };

        let text = rendered(&report);
        assert!(text.contains("Range: 2024-01-01 - 2024-01-31"));
        assert!(text.contains("Credits Used: 4.75"));
        assert!(text.contains("warning: query failed: timeout"));
        assert!(text.contains("1 of 2 panels rendered"));
    }

    #[test]
    fn test_chart_table_is_aligned() {
        let table = Table::new(
            vec![
                Column {
                    name: "WAREHOUSE_NAME".into(),
                    data_type: "TEXT".into(),
                },
                Column {
                    name: "TOTAL_CREDITS_USED".into(),
                    data_type: "FLOAT".into(),
                },
            ],
            vec![
                vec![Value::Str("ADHOC_WH".into()), Value::Float(12.5)],
                vec![Value::Str("LOAD_WH".into()), Value::Float(3.25)],
            ],
        );

        let report = DashboardReport {
            range: range(),
            panels: vec![PanelReport {
                slug: "credit_usage_by_warehouse",
                title: "Credit Usage by Warehouse",
                region: Region::Middle,
                outcome: Ok(PanelView::Chart {
                    spec: ChartSpec::bar(
                        Channel::field("TOTAL_CREDITS_USED"),
                        Channel::field("WAREHOUSE_NAME"),
                    ),
                    table,
                }),
            }],
        };

        let text = rendered(&report);
        assert!(text.contains("## Credit Usage by Warehouse"));
        assert!(text.contains("WAREHOUSE_NAME"));
        assert!(text.contains("ADHOC_WH"));
    }

    #[test]
    fn test_long_cells_truncated() {
        let long = "SELECT ".repeat(30);
        let cell = format_cell(&Value::Str(long));
        assert!(cell.len() <= MAX_CELL_WIDTH);
        assert!(cell.ends_with("..."));
    }
}
