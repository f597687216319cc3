//! Logging and metrics setup shared by every Greeks service component
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("greeksd", LogFormat::Json)?;
//! observability::init_metrics(9100)?;
//! ```
//!
//! Metric handles ([`ServerMetrics`], [`PollerMetrics`]) are cheap to create
//! and become no-ops when no recorder has been installed.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, PollerMetrics, ServerMetrics};
