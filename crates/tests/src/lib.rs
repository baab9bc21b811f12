//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - Configuration round trips
//! - Episode logs -> processor -> dispatcher -> sinks -> training set
//! - Skip-and-continue over failing episodes

#[cfg(test)]
mod fixtures {
    use serde_json::{json, Value};

    /// Obstacles of three parking columns (x = 0, 5, 10) on rows y = 0 and
    /// y = 4; the spot at (5, 4) is free.
    fn obstacles() -> Value {
        let positions: Vec<Value> =
            [(0.0, 0.0), (0.0, 4.0), (5.0, 0.0), (10.0, 0.0), (10.0, 4.0)]
                .iter()
                .map(|(x, y)| json!({ "position": [x, y, 0.0] }))
                .collect();
        json!([positions])
    }

    /// 6 s at 10 Hz along y = 4, heading +x, ending at (5, 4)
    ///
    /// `reverse` backs the agent in from x = 20 instead of driving forward
    /// from x = -10.
    pub fn episode(reverse: bool, intention_time: f64) -> Value {
        let (start_x, vx) = if reverse { (20.0, -2.5) } else { (-10.0, 2.5) };
        let odometry: Vec<Value> = (0..=60)
            .map(|i| {
                let t = i as f64 * 0.1;
                json!({
                    "time": t,
                    "position": [start_x + vx * t, 4.0, 0.0],
                    "orientation": [0.0, 0.0, 0.0],
                    "linear_velocity": [vx, 0.0, 0.0],
                    "angular_velocity": [0.0, 0.0, 0.0],
                })
            })
            .collect();

        json!({
            "vehicle_object_lists": obstacles(),
            "ego_control_list": [
                { "time": 0.0, "reverse": reverse, "gear": if reverse { -1 } else { 1 } },
                { "time": 3.0, "reverse": reverse, "gear": if reverse { -1 } else { 1 } },
            ],
            "ego_odometry_list": odometry,
            "ego_collision_list": [],
            "intention_time_list": [intention_time],
            "vehicle_dict": {},
        })
    }

    /// Forward episode that brushed another vehicle
    pub fn collision_episode() -> Value {
        let mut episode = episode(false, 1.0);
        episode["ego_collision_list"] = json!([{
            "other_id": 7,
            "time": 2.4,
            "normal_impulse": [0.0, 120.0, 0.0],
        }]);
        episode["vehicle_dict"] = json!({ "7": "vehicle.audi.a2" });
        episode
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SinkType;

    const PIPELINE_TOML: &str = r#"
[reconstruction]
exclude_collisions = true
min_vel_thresh = 0.02

[snippets]
n_hist = 10
n_pred = 30
ego_frame = true

[[sinks]]
name = "train"
sink_type = "training_set"
params = { base_path = "./output", format = "bincode", file_stem = "parking" }

[[sinks]]
name = "log"
sink_type = "log"
"#;

    #[test]
    fn test_toml_round_trip() {
        let blueprint = ConfigLoader::load_from_str(PIPELINE_TOML, ConfigFormat::Toml).unwrap();
        assert!(blueprint.reconstruction.exclude_collisions);
        assert_eq!(blueprint.snippets.n_hist, 10);
        assert_eq!(blueprint.snippets.n_skip, 5);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::TrainingSet);
        assert_eq!(blueprint.sinks[1].queue_capacity, 100);

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.snippets.n_pred, 30);
        assert!(reloaded.snippets.ego_frame);
        assert_eq!(reloaded.reconstruction.min_vel_thresh, 0.02);
        assert_eq!(
            reloaded.sinks[0].params.get("file_stem").map(String::as_str),
            Some("parking")
        );

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json.sinks.len(), 2);
    }

    #[test]
    fn test_unknown_sink_format_rejected() {
        let content = r#"
[[sinks]]
name = "files"
sink_type = "file"
params = { format = "npz" }
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("format"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::path::Path;

    use contracts::{
        PipelineBlueprint, ReconstructionConfig, SinkConfig, SinkType, SnippetBatch,
        SnippetConfig, INTENT_UNDETERMINED,
    };
    use dataset::{create_dispatcher, TrainingSet};
    use observability::DatasetMetricsAggregator;
    use tokio::sync::mpsc;
    use trajectory_engine::{EpisodeProcessor, Stage};

    use crate::fixtures;

    fn sink(name: &str, sink_type: SinkType, dir: &Path, format: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type,
            queue_capacity: 16,
            params: HashMap::from([
                ("base_path".to_string(), dir.to_string_lossy().to_string()),
                ("format".to_string(), format.to_string()),
            ]),
        }
    }

    fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    /// Process every episode, skipping failures, and stream the batches
    /// through a dispatcher built from `blueprint`.
    async fn run(
        blueprint: &PipelineBlueprint,
        episodes: &[(&str, String)],
    ) -> (DatasetMetricsAggregator, dataset::DispatchReport) {
        let processor = EpisodeProcessor::from_blueprint(blueprint).unwrap();
        let (tx, rx) = mpsc::channel::<SnippetBatch>(4);
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), rx).unwrap();
        let handle = dispatcher.spawn();

        let mut aggregator = DatasetMetricsAggregator::new();
        for (id, content) in episodes {
            match processor.process_json(*id, content) {
                Ok(batch) => {
                    aggregator.update(&batch.meta, batch.len());
                    tx.send(batch).await.unwrap();
                }
                Err(e) => aggregator.record_skip(e.stage.as_str()),
            }
        }
        drop(tx);

        let report = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("dispatcher timed out")
            .unwrap();
        (aggregator, report)
    }

    /// Episodes -> processor -> dispatcher -> training-set and file sinks
    #[tokio::test]
    async fn test_e2e_training_set() {
        let train_dir = tempfile::tempdir().unwrap();
        let file_dir = tempfile::tempdir().unwrap();
        let blueprint = PipelineBlueprint {
            sinks: vec![
                sink("train", SinkType::TrainingSet, train_dir.path(), "json"),
                sink("files", SinkType::File, file_dir.path(), "bincode"),
                SinkConfig {
                    name: "log".to_string(),
                    sink_type: SinkType::Log,
                    queue_capacity: 16,
                    params: HashMap::new(),
                },
            ],
            ..Default::default()
        };
        let episodes = [
            ("forward", fixtures::episode(false, 1.0).to_string()),
            ("reverse", fixtures::episode(true, 1.0).to_string()),
        ];

        let (aggregator, report) = run(&blueprint, &episodes).await;

        assert_eq!(aggregator.processed_episodes, 2);
        assert_eq!(aggregator.skipped_episodes, 0);
        // 0..6 s log: reference times 0.5, 1.0, ..., 4.0
        assert_eq!(aggregator.total_snippets, 16);
        assert_eq!(report.batches, 2);
        assert!(report.is_complete());

        // Training set
        let written = files_in(train_dir.path());
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("training_set_") && name.ends_with(".json"));
        let set: TrainingSet =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();

        let shape = set.shape().unwrap();
        assert_eq!(shape.num_snippets, 16);
        assert_eq!((shape.n_hist, shape.n_pred), (5, 20));
        assert!(shape.num_goals >= 2);
        assert_eq!(&set.episode_ids[..8], &["forward"; 8]);
        assert_eq!(&set.episode_ids[8..], &["reverse"; 8]);
        assert!((set.reference_times[0] - 0.5).abs() < 1e-9);
        assert!((set.reference_times[7] - 4.0).abs() < 1e-9);

        for i in 0..set.len() {
            // intent resolved at 1.0 s: every future window is locked in
            assert_eq!(set.one_hot_goal[i].iter().sum::<f64>(), 1.0);
            assert_eq!(set.one_hot_goal[i][1], 1.0);
            assert_eq!(set.goal_position[i].len(), shape.num_goals * 3);
        }

        // forward snippets carry positive speed, reversing ones negative
        assert!(set.history_traj_data[0].iter().all(|row| row[3] > 0.0));
        assert!(set.history_traj_data[8].iter().all(|row| row[3] < 0.0));

        // without ego transform the ego arrays are the global ones
        assert_eq!(set.history_traj_data, set.history_traj_data_global);
        assert_eq!(set.future_traj_data, set.future_traj_data_global);

        // Per-episode files
        let files = files_in(file_dir.path());
        assert_eq!(
            files
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect::<Vec<_>>(),
            vec!["forward.bin", "reverse.bin"]
        );
        let batch: SnippetBatch =
            bincode::deserialize(&std::fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(batch.episode_id, "forward");
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.meta.goal_index, 1);
    }

    /// A failing episode is skipped with its stage; the rest still land in the
    /// training set
    #[tokio::test]
    async fn test_e2e_skip_and_continue() {
        let train_dir = tempfile::tempdir().unwrap();
        let blueprint = PipelineBlueprint {
            reconstruction: ReconstructionConfig {
                exclude_collisions: true,
                ..Default::default()
            },
            sinks: vec![sink("train", SinkType::TrainingSet, train_dir.path(), "json")],
            ..Default::default()
        };
        let episodes = [
            ("ep_01", fixtures::episode(false, 1.0).to_string()),
            ("ep_02", fixtures::collision_episode().to_string()),
            ("ep_03", "{ truncated".to_string()),
            ("ep_04", fixtures::episode(true, 2.0).to_string()),
        ];

        let (aggregator, report) = run(&blueprint, &episodes).await;

        assert_eq!(aggregator.processed_episodes, 2);
        assert_eq!(aggregator.skipped_episodes, 2);
        assert_eq!(
            aggregator.skipped_by_stage.get(Stage::Reconstruction.as_str()),
            Some(&1)
        );
        assert_eq!(aggregator.skipped_by_stage.get(Stage::Schema.as_str()), Some(&1));
        assert_eq!(report.batches, 2);

        let written = files_in(train_dir.path());
        assert_eq!(written.len(), 1);
        let set: TrainingSet =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert!(set.episode_ids.iter().all(|id| id == "ep_01" || id == "ep_04"));
        assert_eq!(set.len(), 16);
    }

    #[test]
    fn test_collision_error_names_episode_and_stage() {
        let processor = EpisodeProcessor::new(
            ReconstructionConfig {
                exclude_collisions: true,
                ..Default::default()
            },
            SnippetConfig::default(),
        )
        .unwrap();

        let err = processor
            .process_json("crash_07", &fixtures::collision_episode().to_string())
            .unwrap_err();
        assert_eq!(err.episode_id, "crash_07");
        assert_eq!(err.stage, Stage::Reconstruction);

        // collisions are only reported when exclusion is off
        let lenient = EpisodeProcessor::new(ReconstructionConfig::default(), SnippetConfig::default())
            .unwrap();
        let batch = lenient
            .process_json("crash_07", &fixtures::collision_episode().to_string())
            .unwrap();
        assert_eq!(batch.len(), 8);
    }

    /// Late intent: only windows reaching the switch time carry the goal
    #[test]
    fn test_intent_lock_in_across_snippets() {
        let processor =
            EpisodeProcessor::from_blueprint(&PipelineBlueprint::default()).unwrap();
        let batch = processor
            .process_json("late", &fixtures::episode(false, 5.25).to_string())
            .unwrap();
        let set = TrainingSet::from_batches([&batch]).unwrap();

        assert_eq!(set.len(), 8);
        // reference times 0.5..=3.0 end their future before 5.3 s
        for i in 0..6 {
            assert!(set.future_traj_data[i]
                .iter()
                .all(|row| row[5] == INTENT_UNDETERMINED as f64));
            assert_eq!(set.one_hot_goal[i].iter().sum::<f64>(), 0.0);
        }
        for i in 6..8 {
            assert!(set.future_traj_data[i].iter().all(|row| row[5] == 1.0));
            assert_eq!(set.one_hot_goal[i][1], 1.0);
        }
    }

    /// Agent frame: the agent sits at the origin facing +x at every reference time
    #[test]
    fn test_ego_frame_snippets() {
        let blueprint = PipelineBlueprint {
            snippets: SnippetConfig {
                ego_frame: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let processor = EpisodeProcessor::from_blueprint(&blueprint).unwrap();
        let batch = processor
            .process_json("ego", &fixtures::episode(false, 1.0).to_string())
            .unwrap();
        assert!(batch.meta.ego_frame);

        for i in 0..batch.len() {
            let anchor = batch.features[i].last().unwrap();
            assert!(anchor.x.abs() < 1e-9 && anchor.y.abs() < 1e-9);
            assert!(anchor.heading.abs() < 1e-9);

            let global = batch.features_global[i].last().unwrap();
            assert!((global.y - 4.0).abs() < 1e-9);
            assert_eq!(anchor.velocity, global.velocity);

            // 2.5 m/s straight ahead: the first future sample is 0.25 m forward
            let next = &batch.labels[i][0].state;
            assert!((next.x - 0.25).abs() < 1e-6);
            assert!(next.y.abs() < 1e-9);
        }
    }
}
