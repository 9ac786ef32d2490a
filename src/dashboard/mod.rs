//! The dashboard: a date range, a catalogue of panels, and a sequential
//! runner that executes them against one session.
//!
//! Panels are independent. Each owns its query and display mode; the only
//! shared inputs are the validated [`DateRange`] and the session handle.
//! One failing panel becomes a warning in the report while the rest render
//! normally. A failed range validation, by contrast, stops the pass before
//! any query is issued.

pub mod catalog;
mod date_range;
mod panel;
mod runner;

pub use date_range::{DateRange, DateRangeError};
pub use panel::{Display, Panel, PanelQuery, Region};
pub use runner::{run, DashboardReport, PanelReport, PanelView};
