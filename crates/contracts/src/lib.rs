//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses the simulation log timestamp (seconds, f64) as the only clock
//! - Every per-episode sequence is kept in log order

mod blueprint;
mod episode;
mod episode_id;
mod error;
mod sink;
mod snippet;
mod trajectory;

pub use blueprint::*;
pub use episode::*;
pub use episode_id::EpisodeId;
pub use error::*;
pub use sink::{DatasetSink, LocalDatasetSink};
pub use snippet::*;
pub use trajectory::*;
