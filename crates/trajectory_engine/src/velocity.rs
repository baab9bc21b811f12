//! Signed longitudinal velocity from planar odometry.
//!
//! Odometry only carries a velocity vector, so the sign of the forward speed
//! comes from the reverse flag of the governing control entry. A sign that
//! disagrees with the previous estimate is treated as a possible outlier:
//! whichever sign lands closer to the previous value wins.

use crate::control::ControlSeries;

/// Below this speed (m/s) the gear sign is used without outlier checks
pub const MOVING_SPEED: f64 = 0.05;

/// Sign with `sign(0) == 0`
#[inline]
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Resolves signed forward speed against a control series
#[derive(Debug, Clone, Copy)]
pub struct LongitudinalVelocityEstimator<'a> {
    controls: &'a ControlSeries,
}

impl<'a> LongitudinalVelocityEstimator<'a> {
    pub fn new(controls: &'a ControlSeries) -> Self {
        Self { controls }
    }

    /// Signed forward speed at time `t`.
    ///
    /// `v_prev` is the estimate of the previous odometry sample, `None` for
    /// the first one.
    pub fn estimate(&self, t: f64, vx: f64, vy: f64, v_prev: Option<f64>) -> f64 {
        let speed = (vx * vx + vy * vy).sqrt();
        let gear_sign = if self.controls.is_reverse_at(t) {
            -1.0
        } else {
            1.0
        };
        let with_gear = gear_sign * speed;

        let Some(prev) = v_prev else {
            return with_gear;
        };
        if speed < MOVING_SPEED || sign(prev) == gear_sign {
            return with_gear;
        }

        if (-with_gear - prev).abs() < (with_gear - prev).abs() {
            -with_gear
        } else {
            with_gear
        }
    }

    /// Estimate the whole sequence, feeding each result into the next step
    pub fn resolve<I>(&self, samples: I) -> Vec<f64>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let mut prev = None;
        samples
            .into_iter()
            .map(|(t, vx, vy)| {
                let v = self.estimate(t, vx, vy, prev);
                prev = Some(v);
                v
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ControlSample;

    fn controls(reverse: &[(f64, bool)]) -> ControlSeries {
        let samples: Vec<_> = reverse
            .iter()
            .map(|&(time, reverse)| ControlSample {
                time,
                reverse,
                ..Default::default()
            })
            .collect();
        ControlSeries::from_samples(&samples).unwrap()
    }

    #[test]
    fn test_forward_gear_gives_positive_speed() {
        let series = controls(&[(0.0, false), (1.0, false)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        assert_eq!(estimator.estimate(0.5, 3.0, 4.0, None), 5.0);
    }

    #[test]
    fn test_speed_is_root_of_squared_components() {
        let series = controls(&[(0.0, false)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        for (vx, vy) in [(0.1_f64, 0.2_f64), (1e-3, 7.3), (-2.9, 0.7)] {
            let expected = (vx * vx + vy * vy).sqrt();
            assert_eq!(estimator.estimate(0.0, vx, vy, None).to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn test_reverse_without_history_is_negative() {
        let series = controls(&[(0.0, true)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        assert_eq!(estimator.estimate(0.0, 3.0, 4.0, None), -5.0);
    }

    #[test]
    fn test_sign_flip_closer_to_previous_wins() {
        // reverse engaged while the car still rolls forward
        let series = controls(&[(0.0, true)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        assert_eq!(estimator.estimate(0.0, 1.0, 0.0, Some(1.2)), 1.0);
    }

    #[test]
    fn test_slow_speed_trusts_gear() {
        let series = controls(&[(0.0, true)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        assert_eq!(estimator.estimate(0.0, 0.04, 0.0, Some(1.0)), -0.04);
    }

    #[test]
    fn test_zero_previous_compares_distances() {
        // sign(0) is 0, so the gear sign never matches and distances decide;
        // equal distances keep the gear sign
        let series = controls(&[(0.0, true)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        assert_eq!(estimator.estimate(0.0, 1.0, 0.0, Some(0.0)), -1.0);
    }

    #[test]
    fn test_resolve_chains_previous_estimates() {
        let series = controls(&[(0.0, false), (0.1, true), (0.2, true)]);
        let estimator = LongitudinalVelocityEstimator::new(&series);
        let v = estimator.resolve([(0.0, 1.0, 0.0), (0.1, 1.0, 0.0), (0.2, 0.02, 0.0)]);
        assert_eq!(v, vec![1.0, 1.0, -0.02]);
    }
}
