//! # Trajectory Engine
//!
//! Turns one recorded parking episode into fixed-length prediction snippets.
//!
//! ## Stages
//!
//! 1. Goal extraction: parking spots from the static obstacle grid
//! 2. Control extraction: control log as columns, used for the gear sign
//! 3. Reconstruction: signed velocity, moving window, goal and intent labels
//! 4. Snippet generation: interpolated history/future windows, optionally
//!    re-expressed in the agent frame
//!
//! ## Usage
//!
//! ```ignore
//! use trajectory_engine::EpisodeProcessor;
//!
//! let processor = EpisodeProcessor::from_blueprint(&blueprint)?;
//! let batch = processor.process(&episode)?;
//! println!("{} snippets", batch.len());
//! ```

mod control;
mod error;
mod frame;
mod goals;
mod interpolate;
mod processor;
mod reconstruct;
mod snippets;
mod velocity;

pub use control::{ControlColumn, ControlSeries};
pub use error::{EpisodeError, Result, Stage, TrajectoryError};
pub use frame::{normalize_angle, EgoFrame};
pub use goals::extract_goal_candidates;
pub use interpolate::{interp, unwrap_angles, TrajectoryInterpolator};
pub use processor::EpisodeProcessor;
pub use reconstruct::{nearest_goal, TrajectoryReconstructor};
pub use snippets::{inclusive_range, SnippetGenerator};
pub use velocity::{LongitudinalVelocityEstimator, MOVING_SPEED};
