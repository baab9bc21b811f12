//! Training set assembly
//!
//! Concatenates per-episode snippet batches into the flat arrays the model
//! trainer reads. Field names are the trainer's keys and must not change.

use contracts::{SnippetBatch, INTENT_UNDETERMINED};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Array dimensions shared by every snippet of a training set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingSetShape {
    pub num_snippets: usize,
    pub n_hist: usize,
    pub n_pred: usize,
    pub num_goals: usize,
}

/// Assembled training set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    /// (num_snippets, n_hist, 5), ego frame when enabled
    pub history_traj_data: Vec<Vec<[f64; 5]>>,
    /// (num_snippets, n_pred, 6), ego frame when enabled
    pub future_traj_data: Vec<Vec<[f64; 6]>>,
    pub history_traj_data_global: Vec<Vec<[f64; 5]>>,
    pub future_traj_data_global: Vec<Vec<[f64; 6]>>,
    /// (num_snippets, num_goals, 3)
    pub goal_snapshots: Vec<Vec<[f64; 3]>>,
    /// (num_snippets, num_goals * 3), row-major flattening of `goal_snapshots`
    pub goal_position: Vec<Vec<f64>>,
    /// (num_snippets, num_goals), all zeros when the intent is undetermined
    pub one_hot_goal: Vec<Vec<f64>>,
    pub episode_ids: Vec<String>,
    pub reference_times: Vec<f64>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate batches in order
    ///
    /// # Errors
    /// `ShapeMismatch` when a batch disagrees with the first non-empty one on
    /// window lengths or goal count.
    pub fn from_batches<'a>(
        batches: impl IntoIterator<Item = &'a SnippetBatch>,
    ) -> Result<Self, DatasetError> {
        let mut set = Self::new();
        for batch in batches {
            set.push_batch(batch)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.reference_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_times.is_empty()
    }

    /// Current dimensions, `None` while empty
    pub fn shape(&self) -> Option<TrainingSetShape> {
        Some(TrainingSetShape {
            num_snippets: self.len(),
            n_hist: self.history_traj_data.first()?.len(),
            n_pred: self.future_traj_data.first()?.len(),
            num_goals: self.one_hot_goal.first()?.len(),
        })
    }

    /// Append one batch; returns the number of snippets added.
    ///
    /// The batch is checked completely before anything is appended, so a
    /// rejected batch leaves the set unchanged.
    pub fn push_batch(&mut self, batch: &SnippetBatch) -> Result<usize, DatasetError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let expected = self.shape().unwrap_or(TrainingSetShape {
            num_snippets: 0,
            n_hist: batch.meta.n_hist,
            n_pred: batch.meta.n_pred,
            num_goals: batch.meta.num_goals,
        });
        let one_hot_index = Self::check_batch(batch, &expected)?;

        for i in 0..batch.len() {
            let goals: Vec<[f64; 3]> = batch.goals[i].iter().map(|g| g.to_row()).collect();
            let mut one_hot = vec![0.0; expected.num_goals];
            if let Some(goal) = one_hot_index[i] {
                one_hot[goal] = 1.0;
            }

            self.history_traj_data
                .push(batch.features[i].iter().map(|s| s.to_row()).collect());
            self.future_traj_data
                .push(batch.labels[i].iter().map(|l| l.to_row()).collect());
            self.history_traj_data_global
                .push(batch.features_global[i].iter().map(|s| s.to_row()).collect());
            self.future_traj_data_global
                .push(batch.labels_global[i].iter().map(|l| l.to_row()).collect());
            self.goal_position
                .push(goals.iter().flatten().copied().collect());
            self.goal_snapshots.push(goals);
            self.one_hot_goal.push(one_hot);
            self.episode_ids.push(batch.episode_id.to_string());
            self.reference_times.push(batch.reference_times[i]);
        }

        Ok(batch.len())
    }

    /// Validate dimensions and resolve the one-hot index of every snippet
    fn check_batch(
        batch: &SnippetBatch,
        expected: &TrainingSetShape,
    ) -> Result<Vec<Option<usize>>, DatasetError> {
        let id = &batch.episode_id;
        let n = batch.len();
        for (field, found) in [
            ("features", batch.features.len()),
            ("labels", batch.labels.len()),
            ("features_global", batch.features_global.len()),
            ("labels_global", batch.labels_global.len()),
            ("goals", batch.goals.len()),
        ] {
            if found != n {
                return Err(DatasetError::shape_mismatch(id, field, n, found));
            }
        }

        let mut one_hot_index = Vec::with_capacity(n);
        for i in 0..n {
            for (field, len, want) in [
                ("history_traj_data", batch.features[i].len(), expected.n_hist),
                ("history_traj_data_global", batch.features_global[i].len(), expected.n_hist),
                ("future_traj_data", batch.labels[i].len(), expected.n_pred),
                ("future_traj_data_global", batch.labels_global[i].len(), expected.n_pred),
                ("goal_snapshots", batch.goals[i].len(), expected.num_goals),
            ] {
                if len != want {
                    return Err(DatasetError::shape_mismatch(id, field, want, len));
                }
            }

            // intent is constant across a label window
            let intent = batch.labels[i]
                .first()
                .map_or(INTENT_UNDETERMINED, |l| l.intent);
            let index = usize::try_from(intent).ok();
            if let Some(goal) = index {
                if goal >= expected.num_goals {
                    return Err(DatasetError::shape_mismatch(
                        id,
                        "one_hot_goal",
                        expected.num_goals,
                        goal + 1,
                    ));
                }
            }
            one_hot_index.push(index);
        }
        Ok(one_hot_index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use contracts::{GoalCandidate, KinematicState, LabeledState, SnippetMeta};

    /// Batch with `n` snippets, 2 history rows, 3 future rows and `goals` goals
    pub(crate) fn batch(id: &str, n: usize, goals: usize, intent: i32) -> SnippetBatch {
        let state = |x: f64| KinematicState {
            x,
            y: 1.0,
            heading: 0.1,
            velocity: 2.0,
            yaw_rate: 0.0,
        };
        let features: Vec<Vec<KinematicState>> =
            (0..n).map(|i| vec![state(i as f64), state(i as f64 + 0.5)]).collect();
        let labels: Vec<Vec<LabeledState>> = (0..n)
            .map(|i| {
                (1..=3)
                    .map(|k| LabeledState {
                        state: state(i as f64 + k as f64),
                        intent,
                    })
                    .collect()
            })
            .collect();
        let goal_set: Vec<GoalCandidate> = (0..goals)
            .map(|g| GoalCandidate {
                x: g as f64,
                y: 5.0,
                free: g % 2 == 0,
            })
            .collect();

        SnippetBatch {
            episode_id: id.into(),
            reference_times: (0..n).map(|i| 0.5 * (i + 1) as f64).collect(),
            features_global: features.clone(),
            labels_global: labels.clone(),
            features,
            labels,
            goals: vec![goal_set; n],
            meta: SnippetMeta {
                n_hist: 2,
                n_pred: 3,
                num_goals: goals,
                goal_index: intent.max(0) as usize,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_concatenates_batches() {
        let a = batch("ep_a", 2, 3, 1);
        let b = batch("ep_b", 3, 3, INTENT_UNDETERMINED);
        let set = TrainingSet::from_batches([&a, &b]).unwrap();

        assert_eq!(
            set.shape(),
            Some(TrainingSetShape {
                num_snippets: 5,
                n_hist: 2,
                n_pred: 3,
                num_goals: 3,
            })
        );
        assert_eq!(set.episode_ids, vec!["ep_a", "ep_a", "ep_b", "ep_b", "ep_b"]);
        assert_eq!(set.reference_times[2], 0.5);
    }

    #[test]
    fn test_one_hot_from_label_intent() {
        let a = batch("ep_a", 1, 3, 1);
        let b = batch("ep_b", 1, 3, INTENT_UNDETERMINED);
        let set = TrainingSet::from_batches([&a, &b]).unwrap();

        assert_eq!(set.one_hot_goal[0], vec![0.0, 1.0, 0.0]);
        assert_eq!(set.one_hot_goal[1], vec![0.0, 0.0, 0.0]);
        assert_eq!(set.future_traj_data[1][0][5], -1.0);
    }

    #[test]
    fn test_goal_position_is_flattened_snapshot() {
        let set = TrainingSet::from_batches([&batch("ep", 1, 2, 0)]).unwrap();
        assert_eq!(set.goal_snapshots[0], vec![[0.0, 5.0, 1.0], [1.0, 5.0, 0.0]]);
        assert_eq!(set.goal_position[0], vec![0.0, 5.0, 1.0, 1.0, 5.0, 0.0]);
    }

    #[test]
    fn test_goal_count_mismatch_rejected() {
        let mut set = TrainingSet::from_batches([&batch("ep_a", 2, 3, 0)]).unwrap();
        let err = set.push_batch(&batch("ep_b", 2, 4, 0)).unwrap_err();

        match err {
            DatasetError::ShapeMismatch {
                episode_id,
                field,
                expected,
                found,
            } => {
                assert_eq!(episode_id, "ep_b");
                assert_eq!(field, "goal_snapshots");
                assert_eq!((expected, found), (3, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
        // rejected batch leaves the set untouched
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_intent_outside_goal_set_rejected() {
        let err = TrainingSet::from_batches([&batch("ep", 1, 2, 5)]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ShapeMismatch {
                field: "one_hot_goal",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_batches_are_skipped() {
        let empty = SnippetBatch::empty("ep_empty".into(), SnippetMeta::default());
        let set = TrainingSet::from_batches([&empty, &batch("ep", 1, 2, 0)]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(TrainingSet::from_batches([&empty]).unwrap().shape().is_none());
    }

    #[test]
    fn test_serialized_keys() {
        let set = TrainingSet::from_batches([&batch("ep", 1, 2, 0)]).unwrap();
        let value = serde_json::to_value(&set).unwrap();
        for key in [
            "history_traj_data",
            "future_traj_data",
            "history_traj_data_global",
            "future_traj_data_global",
            "goal_snapshots",
            "goal_position",
            "one_hot_goal",
            "episode_ids",
            "reference_times",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }
}
