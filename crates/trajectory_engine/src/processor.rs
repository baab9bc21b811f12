//! Per-episode pipeline: goals, controls, reconstruction, snippets.

use std::time::Instant;

use contracts::{
    Episode, EpisodeId, PipelineBlueprint, ReconstructionConfig, SnippetBatch, SnippetConfig,
};
use tracing::{debug, info, instrument};

use crate::control::ControlSeries;
use crate::error::{EpisodeError, Result, Stage, TrajectoryError};
use crate::goals::extract_goal_candidates;
use crate::reconstruct::TrajectoryReconstructor;
use crate::snippets::SnippetGenerator;

/// Runs every stage for one episode
///
/// Holds no per-episode state, so one processor can serve many episodes
/// concurrently.
#[derive(Debug, Clone)]
pub struct EpisodeProcessor {
    reconstructor: TrajectoryReconstructor,
    generator: SnippetGenerator,
}

impl EpisodeProcessor {
    /// # Errors
    /// `InvalidParameter` when either section is out of range.
    pub fn new(reconstruction: ReconstructionConfig, snippets: SnippetConfig) -> Result<Self> {
        Ok(Self {
            reconstructor: TrajectoryReconstructor::new(reconstruction)?,
            generator: SnippetGenerator::new(snippets)?,
        })
    }

    pub fn from_blueprint(blueprint: &PipelineBlueprint) -> Result<Self> {
        Self::new(blueprint.reconstruction.clone(), blueprint.snippets.clone())
    }

    pub fn snippet_config(&self) -> &SnippetConfig {
        self.generator.config()
    }

    /// Decode a JSON episode log and process it
    pub fn process_json(
        &self,
        id: impl Into<EpisodeId>,
        content: &str,
    ) -> std::result::Result<SnippetBatch, EpisodeError> {
        let id = id.into();
        let episode = Episode::from_json_str(id.clone(), content)
            .map_err(|e| EpisodeError::new(id, Stage::Schema, e))?;
        self.process(&episode)
    }

    /// Turn one episode into its snippet batch
    ///
    /// # Errors
    /// The first failing stage, tagged with the episode id.
    #[instrument(name = "process_episode", skip_all, fields(episode_id = %episode.id))]
    pub fn process(&self, episode: &Episode) -> std::result::Result<SnippetBatch, EpisodeError> {
        let fail = |stage: Stage| {
            let id = episode.id.clone();
            move |source: TrajectoryError| EpisodeError::new(id, stage, source)
        };

        let goals = timed(Stage::GoalExtraction, || {
            extract_goal_candidates(&episode.obstacles)
        })
        .map_err(fail(Stage::GoalExtraction))?;

        let controls = timed(Stage::ControlExtraction, || {
            ControlSeries::from_samples(&episode.controls)
        })
        .map_err(fail(Stage::ControlExtraction))?;

        let trajectory = timed(Stage::Reconstruction, || {
            self.reconstructor.reconstruct(episode, &controls, &goals)
        })
        .map_err(fail(Stage::Reconstruction))?;

        let batch = timed(Stage::SnippetGeneration, || {
            Ok(self.generator.generate(&episode.id, &trajectory, &goals))
        })
        .map_err(fail(Stage::SnippetGeneration))?;

        info!(
            snippets = batch.len(),
            goal_index = trajectory.goal_index,
            num_goals = goals.len(),
            clamped_queries = batch.meta.clamped_queries,
            "episode processed"
        );
        Ok(batch)
    }
}

fn timed<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Instant::now();
    let result = f();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    observability::record_stage_latency_ms(stage.as_str(), elapsed_ms);
    debug!(stage = %stage, elapsed_ms, ok = result.is_ok(), "stage finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ControlSample, OdometrySample, StaticObstacle};

    /// Three parking columns at x = 0, 5, 10 with rows y = 0 and y = 4; the
    /// agent drives along y = 4 from x = -10 towards x = 5 over 6 s.
    fn parking_episode() -> Episode {
        let obstacles = [(0.0, 0.0), (0.0, 4.0), (5.0, 0.0), (10.0, 0.0), (10.0, 4.0)]
            .into_iter()
            .map(|(x, y)| StaticObstacle { x, y })
            .collect();
        let odometry = (0..=60)
            .map(|i| {
                let time = i as f64 * 0.1;
                OdometrySample {
                    time,
                    x: -10.0 + 2.5 * time,
                    y: 4.0,
                    vx: 2.5,
                    ..Default::default()
                }
            })
            .collect();
        Episode {
            id: "parking_01".into(),
            obstacles,
            controls: vec![ControlSample {
                time: 0.0,
                gear: 1,
                ..Default::default()
            }],
            odometry,
            collisions: Vec::new(),
            intention_time: 1.0,
        }
    }

    fn processor() -> EpisodeProcessor {
        EpisodeProcessor::new(ReconstructionConfig::default(), SnippetConfig::default()).unwrap()
    }

    #[test]
    fn test_process_parking_episode() {
        let batch = processor().process(&parking_episode()).unwrap();

        // moving window 0..6 s: reference times 0.5..4.0 every 0.5 s
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.meta.num_goals, 2);
        // ends at (5, 4), the free spot of the middle column
        assert_eq!(batch.meta.goal_index, 1);
        assert!(batch.goals[0][1].free);
        assert!(!batch.goals[0][0].free);
        assert_eq!(batch.episode_id.as_str(), "parking_01");
    }

    #[test]
    fn test_failure_reports_stage() {
        let mut episode = parking_episode();
        episode.obstacles.clear();
        let err = processor().process(&episode).unwrap_err();
        assert_eq!(err.stage, Stage::GoalExtraction);
        assert!(matches!(err.source, TrajectoryError::EmptyGoalSet { .. }));

        let mut episode = parking_episode();
        episode.intention_time = 100.0;
        let err = processor().process(&episode).unwrap_err();
        assert_eq!(err.stage, Stage::Reconstruction);
        assert_eq!(err.episode_id.as_str(), "parking_01");
    }

    #[test]
    fn test_schema_errors_are_tagged() {
        let err = processor().process_json("broken", "{ not json").unwrap_err();
        assert_eq!(err.stage, Stage::Schema);
        assert!(matches!(err.source, TrajectoryError::Contract(_)));
    }
}
