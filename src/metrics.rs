use std::sync::OnceLock;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::explorer::FilterTab;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload. Safe to call more than once; the
/// recorder is installed on the first call only.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            // Pre-register counters so they appear even before the first increment.
            counter!("trader_searches_total").absolute(0);
            counter!("trader_counts_total").absolute(0);
            counter!("stale_counts_dropped_total").absolute(0);
            for tab in FilterTab::ALL {
                counter!("filter_changes_total", "tab" => tab.as_str()).absolute(0);
            }

            // Histograms are lazily created on first record; force creation.
            histogram!("trader_query_latency_seconds", "kind" => "search").record(0.0);
            histogram!("trader_query_latency_seconds", "kind" => "count").record(0.0);

            handle
        })
        .clone()
}
