//! Monitoring engine façade for a key-value server.
//!
//! One [`Monitor`] instance owns the connection to a single monitored
//! server, a background polling loop that samples and evaluates health on a
//! fixed interval, and bounded in-memory histories of alerts and collection
//! errors. Consumers (HTTP layer, analysis pipeline, UI) call the façade
//! operations; nothing in this crate is fatal to the hosting process — a
//! persistent outage degrades to repeatedly logged collection failures.

pub mod config;
pub mod error;
pub mod history;
pub mod monitor;
pub mod state;


pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::Monitor;
pub use state::{AnalysisContext, StatusSummary};
