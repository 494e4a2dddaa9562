//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! cache / limiter / rpc / gateway produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → Log output (stdout, filtered by RUST_LOG)
//!     → Whatever metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library only records; exporter installation (Prometheus or
//!   otherwise) belongs to the embedding application
//! - Metric updates are cheap atomic operations, safe on hot paths

pub mod logging;
pub mod metrics;
