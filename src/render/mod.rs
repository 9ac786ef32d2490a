//! Report rendering.
//!
//! The [`Renderer`] trait is the output seam: the runner produces a
//! [`DashboardReport`] and [`render`] walks it, dispatching each panel to
//! the renderer by view kind. The renderer decides presentation only; it
//! never re-queries or reorders panels.

mod text;

use std::io;

pub use text::TextRenderer;

use crate::chart::ChartSpec;
use crate::dashboard::{DashboardReport, PanelView, Region};
use crate::table::Table;

/// Per-panel layout hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOptions {
    /// Bottom-region panels span the full page width.
    pub full_width: bool,
}

/// An output target for a dashboard report.
pub trait Renderer {
    /// Called once before any panel.
    fn begin(&mut self, report: &DashboardReport) -> io::Result<()>;

    /// A headline metric.
    fn metric(&mut self, title: &str, value: &str) -> io::Result<()>;

    /// A chart panel.
    fn chart(
        &mut self,
        title: &str,
        spec: &ChartSpec,
        table: &Table,
        layout: &LayoutOptions,
    ) -> io::Result<()>;

    /// The raw table listed under a chart.
    fn listing(&mut self, table: &Table) -> io::Result<()>;

    /// A failed panel, shown in place without disturbing its neighbours.
    fn warning(&mut self, title: &str, message: &str) -> io::Result<()>;

    /// Called once after the last panel.
    fn end(&mut self, report: &DashboardReport) -> io::Result<()>;
}

/// Walk a report through a renderer, in panel order.
pub fn render<R: Renderer>(renderer: &mut R, report: &DashboardReport) -> io::Result<()> {
    renderer.begin(report)?;

    for panel in &report.panels {
        let layout = LayoutOptions {
            full_width: panel.region == Region::Bottom,
        };

        match &panel.outcome {
            Ok(PanelView::Metric { value }) => renderer.metric(panel.title, value)?,
            Ok(PanelView::Chart { spec, table }) => {
                renderer.chart(panel.title, spec, table, &layout)?
            }
            Ok(PanelView::ChartWithListing { spec, table }) => {
                renderer.chart(panel.title, spec, table, &layout)?;
                renderer.listing(table)?;
            }
            Err(message) => renderer.warning(panel.title, message)?,
        }
    }

    renderer.end(report)
}
