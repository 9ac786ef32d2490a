//! snowscope - a Snowflake account-usage dashboard.
//!
//! Renders the ACCOUNT_USAGE telemetry views as a fixed catalogue of
//! panels: headline metrics up top, credit/latency charts below, all
//! filtered to one operator-selected date range.
//!
//! # Architecture
//!
//! ```text
//! DateRange ──► catalog (11 panels) ──► runner ──► DashboardReport
//!                    │                    │              │
//!                    ▼                    ▼              ▼
//!               sql builder      QuerySession       Renderer
//!              (Snowflake SQL)  (worker process)  (text / JSON)
//! ```
//!
//! Construction of the [`dashboard::DateRange`] validates the window once;
//! the catalogue derives every panel query from it; the runner executes
//! them sequentially against one authenticated [`session::Session`],
//! isolating per-panel failures; a [`render::Renderer`] walks the report.
//!
//! # Example
//!
//! ```no_run
//! use snowscope::dashboard::{self, DateRange};
//! use snowscope::render::{self, TextRenderer};
//! use snowscope::session::{LoginOptions, Session, WorkerClient};
//!
//! # async fn demo(connection: snowscope::session::protocol::ConnectionParams)
//! # -> Result<(), Box<dyn std::error::Error>> {
//! let client = std::sync::Arc::new(WorkerClient::spawn("./snowscope-worker").await?);
//! let session = Session::login(client, connection, LoginOptions::default()).await?;
//!
//! let range = DateRange::trailing_days(31);
//! let report = dashboard::run(&session, &range).await;
//!
//! let mut renderer = TextRenderer::stdout();
//! render::render(&mut renderer, &report)?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod session;
pub mod sql;
pub mod table;

/// Commonly used types.
pub mod prelude {
    pub use crate::chart::ChartSpec;
    pub use crate::config::Settings;
    pub use crate::dashboard::{DashboardReport, DateRange, PanelReport, PanelView};
    pub use crate::render::{Renderer, TextRenderer};
    pub use crate::session::{LoginOptions, QuerySession, Session, WorkerClient};
    pub use crate::table::Table;
}
