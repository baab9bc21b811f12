//! Dataset generation metrics
//!
//! Records per-episode results through the `metrics` facade and keeps an
//! in-memory aggregate for the end-of-run summary.

use std::collections::{BTreeMap, HashMap};

use contracts::SnippetMeta;
use metrics::{counter, gauge, histogram};

/// Record a successfully processed episode
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_episode_processed;
///
/// let batch = processor.process(&episode)?;
/// record_episode_processed(&batch.meta, batch.len());
/// ```
pub fn record_episode_processed(meta: &SnippetMeta, snippets: usize) {
    counter!("intent_snippets_episodes_total", "status" => "processed").increment(1);
    counter!("intent_snippets_snippets_total").increment(snippets as u64);
    histogram!("intent_snippets_snippets_per_episode").record(snippets as f64);
    histogram!("intent_snippets_usable_duration_s").record(meta.usable_duration);
    histogram!("intent_snippets_trajectory_samples").record(meta.trajectory_samples as f64);
    gauge!("intent_snippets_last_goal_index").set(meta.goal_index as f64);

    if snippets == 0 {
        counter!("intent_snippets_empty_batches_total").increment(1);
    }
    if meta.clamped_queries > 0 {
        counter!("intent_snippets_clamped_queries_total").increment(meta.clamped_queries as u64);
    }
}

/// Record a skipped episode with the stage that rejected it
pub fn record_episode_skipped(stage: &str) {
    counter!(
        "intent_snippets_episodes_total",
        "status" => "skipped",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a batch handed to a sink
pub fn record_batch_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "intent_snippets_batches_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the wall time of one pipeline stage
pub fn record_stage_latency_ms(stage: &str, latency_ms: f64) {
    histogram!("intent_snippets_stage_latency_ms", "stage" => stage.to_string())
        .record(latency_ms);
}

/// Run-level aggregate of episode results
#[derive(Debug, Clone, Default)]
pub struct DatasetMetricsAggregator {
    pub processed_episodes: u64,
    pub skipped_episodes: u64,
    pub total_snippets: u64,
    /// Processed episodes that yielded no snippet
    pub empty_batches: u64,
    pub clamped_queries: u64,
    pub snippets_per_episode: RunningStats,
    pub usable_duration: RunningStats,
    pub skipped_by_stage: HashMap<String, u64>,
    /// Episodes per reached goal index
    pub goal_counts: BTreeMap<usize, u64>,
}

impl DatasetMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account a processed episode
    pub fn update(&mut self, meta: &SnippetMeta, snippets: usize) {
        self.processed_episodes += 1;
        self.total_snippets += snippets as u64;
        self.clamped_queries += meta.clamped_queries as u64;
        if snippets == 0 {
            self.empty_batches += 1;
        }
        self.snippets_per_episode.push(snippets as f64);
        self.usable_duration.push(meta.usable_duration);
        *self.goal_counts.entry(meta.goal_index).or_insert(0) += 1;
    }

    /// Account a skipped episode
    pub fn record_skip(&mut self, stage: &str) {
        self.skipped_episodes += 1;
        *self.skipped_by_stage.entry(stage.to_string()).or_insert(0) += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let total = self.processed_episodes + self.skipped_episodes;
        MetricsSummary {
            processed_episodes: self.processed_episodes,
            skipped_episodes: self.skipped_episodes,
            total_snippets: self.total_snippets,
            empty_batches: self.empty_batches,
            clamped_queries: self.clamped_queries,
            skip_rate: if total > 0 {
                self.skipped_episodes as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            snippets_per_episode: StatsSummary::from(&self.snippets_per_episode),
            usable_duration_s: StatsSummary::from(&self.usable_duration),
            skipped_by_stage: self.skipped_by_stage.clone(),
            goal_counts: self.goal_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub processed_episodes: u64,
    pub skipped_episodes: u64,
    pub total_snippets: u64,
    pub empty_batches: u64,
    pub clamped_queries: u64,
    pub skip_rate: f64,
    pub snippets_per_episode: StatsSummary,
    pub usable_duration_s: StatsSummary,
    pub skipped_by_stage: HashMap<String, u64>,
    pub goal_counts: BTreeMap<usize, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dataset Summary ===")?;
        writeln!(f, "Processed episodes: {}", self.processed_episodes)?;
        writeln!(
            f,
            "Skipped episodes: {} ({:.2}%)",
            self.skipped_episodes, self.skip_rate
        )?;
        writeln!(f, "Total snippets: {}", self.total_snippets)?;
        writeln!(f, "Episodes without snippets: {}", self.empty_batches)?;
        writeln!(f, "Clamped query samples: {}", self.clamped_queries)?;
        writeln!(f, "Snippets per episode: {}", self.snippets_per_episode)?;
        writeln!(f, "Usable duration (s): {}", self.usable_duration_s)?;

        if !self.goal_counts.is_empty() {
            writeln!(f, "Episodes per goal:")?;
            for (goal, count) in &self.goal_counts {
                writeln!(f, "  {}: {}", goal, count)?;
            }
        }

        if !self.skipped_by_stage.is_empty() {
            writeln!(f, "Skipped by stage:")?;
            let mut stages: Vec<_> = self.skipped_by_stage.iter().collect();
            stages.sort();
            for (stage, count) in stages {
                writeln!(f, "  {}: {}", stage, count)?;
            }
        }

        Ok(())
    }
}

/// Descriptive statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = DatasetMetricsAggregator::new();
        let meta = SnippetMeta {
            goal_index: 3,
            clamped_queries: 4,
            usable_duration: 12.5,
            ..Default::default()
        };

        aggregator.update(&meta, 10);
        aggregator.update(&meta, 0);
        aggregator.record_skip("reconstruction");

        assert_eq!(aggregator.processed_episodes, 2);
        assert_eq!(aggregator.total_snippets, 10);
        assert_eq!(aggregator.empty_batches, 1);
        assert_eq!(aggregator.clamped_queries, 8);
        assert_eq!(aggregator.goal_counts.get(&3), Some(&2));
        assert_eq!(aggregator.skipped_by_stage.get("reconstruction"), Some(&1));

        let summary = aggregator.summary();
        assert!((summary.skip_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.snippets_per_episode.count, 2);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DatasetMetricsAggregator::new();
        aggregator.update(&SnippetMeta::default(), 6);
        aggregator.record_skip("schema");

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Processed episodes: 1"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("schema: 1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_episode_processed(&SnippetMeta::default(), 3);
        record_episode_skipped("goal_extraction");
        record_batch_dispatched("log", true);
        record_stage_latency_ms("reconstruction", 1.5);
    }
}
