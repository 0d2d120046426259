//! Reporting sink for final-cutoff metrics.
//!
//! Publishing metrics is a side effect outside the metric engine. A sink
//! receives named scalar values; [`TracingSink`] logs them.

use super::metrics::SystemMetrics;
use tracing::info;

/// Destination for named metric values.
pub trait MetricsSink {
    fn log_metric(&self, name: &str, value: f64);
}

/// Logs each metric as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn log_metric(&self, name: &str, value: f64) {
        info!(metric = name, value, "metric");
    }
}

/// Publishes MAP, precision, recall and F1 at the deepest cutoff.
///
/// Does nothing for an empty sweep.
pub fn report_final_cutoff(system: &SystemMetrics, sink: &dyn MetricsSink) {
    let Some(last) = system.final_cutoff() else {
        return;
    };
    sink.log_metric("mean_avg_precision", last.map);
    sink.log_metric("prec_k", last.precision);
    sink.log_metric("recall_k", last.recall);
    sink.log_metric("f1_k", last.f1);
}
