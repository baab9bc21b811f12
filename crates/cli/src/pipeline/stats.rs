//! Run statistics.

use std::time::Duration;

use dataset::DispatchReport;
use observability::DatasetMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Episode files handed to the pipeline
    pub episodes_found: usize,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Total duration of the run
    pub duration: Duration,

    /// Stopped by a shutdown signal before every episode was processed
    pub interrupted: bool,

    /// Per-episode results
    pub dataset: DatasetMetricsAggregator,

    /// Per-sink delivery totals
    pub dispatch: DispatchReport,
}

impl RunStats {
    /// Episodes (processed or skipped) per second
    pub fn episodes_per_second(&self) -> f64 {
        let handled = self.dataset.processed_episodes + self.dataset.skipped_episodes;
        if self.duration.as_secs_f64() > 0.0 {
            handled as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Run Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Episodes found: {}", self.episodes_found);
        println!("   ├─ Episodes/s: {:.2}", self.episodes_per_second());
        println!("   ├─ Active sinks: {}", self.active_sinks);
        println!("   └─ Interrupted: {}", if self.interrupted { "yes" } else { "no" });

        println!("\n{}", self.dataset.summary());

        if !self.dispatch.sinks.is_empty() {
            println!("Sinks ({} batches dispatched)", self.dispatch.batches);
            for (name, metrics) in &self.dispatch.sinks {
                println!(
                    "   ├─ {}: written={}, snippets={}, dropped={}, failed={}",
                    name,
                    metrics.write_count,
                    metrics.snippet_count,
                    metrics.dropped_count,
                    metrics.failure_count
                );
            }
            if !self.dispatch.is_complete() {
                println!("   └─ ⚠ Some batches were not delivered to every sink");
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SnippetMeta;

    #[test]
    fn test_episodes_per_second() {
        let mut stats = RunStats {
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        stats.dataset.update(&SnippetMeta::default(), 4);
        stats.dataset.record_skip("schema");
        stats.dataset.update(&SnippetMeta::default(), 1);
        stats.dataset.record_skip("reconstruction");

        assert!((stats.episodes_per_second() - 2.0).abs() < 1e-9);
        assert_eq!(RunStats::default().episodes_per_second(), 0.0);
    }
}
