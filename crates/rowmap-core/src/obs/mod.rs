//! Observability: runtime counters and the sink boundary that feeds them.

pub mod metrics;
pub mod sink;

// re-exports
pub use metrics::{MetricsState, SchemaCounters};
pub use sink::{MetricsEvent, MetricsSink, with_metrics_sink};
