//! Ego-frame transform.
//!
//! The ego frame is centred on the agent position at the snippet reference
//! time, with the x axis along its heading.

use std::f64::consts::{PI, TAU};

use contracts::{GoalCandidate, KinematicState, LabeledState};
use nalgebra::{Matrix2, Vector2};

/// Wrap an angle into `(-π, π]`
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Rigid transform into the agent frame of a reference state
#[derive(Debug, Clone, Copy)]
pub struct EgoFrame {
    origin: Vector2<f64>,
    heading: f64,
    rotation: Matrix2<f64>,
}

impl EgoFrame {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        let (s, c) = heading.sin_cos();
        Self {
            origin: Vector2::new(x, y),
            heading,
            rotation: Matrix2::new(c, s, -s, c),
        }
    }

    /// Frame anchored at a kinematic state
    pub fn at(state: &KinematicState) -> Self {
        Self::new(state.x, state.y, state.heading)
    }

    /// Map-frame point to ego frame
    #[inline]
    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        let local = self.rotation * (Vector2::new(x, y) - self.origin);
        (local.x, local.y)
    }

    /// Map-frame heading to ego frame
    #[inline]
    pub fn heading(&self, heading: f64) -> f64 {
        normalize_angle(heading - self.heading)
    }

    /// Position and heading are transformed, rates are frame invariant
    pub fn state(&self, state: &KinematicState) -> KinematicState {
        let (x, y) = self.point(state.x, state.y);
        KinematicState {
            x,
            y,
            heading: self.heading(state.heading),
            ..*state
        }
    }

    pub fn label(&self, label: &LabeledState) -> LabeledState {
        LabeledState {
            state: self.state(&label.state),
            intent: label.intent,
        }
    }

    /// Goal position only, occupancy is kept
    pub fn goal(&self, goal: &GoalCandidate) -> GoalCandidate {
        let (x, y) = self.point(goal.x, goal.y);
        GoalCandidate { x, y, ..*goal }
    }
}
