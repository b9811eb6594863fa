//! Push-based observability for the DCA engine
//!
//! This module provides observability through **outbound data only**: metrics
//! are kept in a Prometheus registry and periodically written to stdout as
//! structured JSON (for Loki, Fluentd, CloudWatch). There is no metrics endpoint.

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
