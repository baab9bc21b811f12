//! Goal candidate extraction from static obstacles.

use contracts::{GoalCandidate, StaticObstacle};
use tracing::debug;

use crate::error::{Result, TrajectoryError};

/// Squared distance below which a candidate counts as occupied
const OCCUPIED_DIST_SQ: f64 = 1e-6;

/// Obstacle coordinates are snapped to this many decimals
const COORD_DECIMALS: i32 = 2;

#[inline]
fn snap(value: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (value * scale).round() / scale
}

/// Sorted distinct values
fn distinct(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Build the ordered goal candidate set.
///
/// Candidates are the cross product of the distinct obstacle x and y
/// coordinates, x-major. The columns at the minimum and maximum x are
/// boundary columns and never destinations.
pub fn extract_goal_candidates(obstacles: &[StaticObstacle]) -> Result<Vec<GoalCandidate>> {
    let occupied: Vec<(f64, f64)> = obstacles
        .iter()
        .map(|o| (snap(o.x), snap(o.y)))
        .collect();

    let xs = distinct(occupied.iter().map(|p| p.0).collect());
    let ys = distinct(occupied.iter().map(|p| p.1).collect());

    let inner_columns = xs.len().saturating_sub(2);
    let mut goals = Vec::with_capacity(inner_columns * ys.len());

    for &x in xs.iter().skip(1).take(inner_columns) {
        for &y in &ys {
            let nearest = occupied
                .iter()
                .map(|&(ox, oy)| (ox - x).powi(2) + (oy - y).powi(2))
                .fold(f64::INFINITY, f64::min);
            goals.push(GoalCandidate {
                x,
                y,
                free: nearest >= OCCUPIED_DIST_SQ,
            });
        }
    }

    if goals.is_empty() {
        return Err(TrajectoryError::EmptyGoalSet {
            obstacles: obstacles.len(),
        });
    }

    debug!(
        candidates = goals.len(),
        free = goals.iter().filter(|g| g.free).count(),
        "goal candidates extracted"
    );
    Ok(goals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(x: f64, y: f64) -> StaticObstacle {
        StaticObstacle { x, y }
    }

    #[test]
    fn test_boundary_columns_excluded() {
        // x in {0, 1, 2}, y in {0, 1}; only the middle column survives
        let obstacles = vec![
            obstacle(0.0, 0.0),
            obstacle(0.0, 1.0),
            obstacle(1.0, 0.0),
            obstacle(2.0, 1.0),
        ];
        let goals = extract_goal_candidates(&obstacles).unwrap();
        assert_eq!(goals.len(), 2);
        assert!(goals.iter().all(|g| g.x == 1.0));
        assert_eq!(goals[0].y, 0.0);
        assert_eq!(goals[1].y, 1.0);
    }

    #[test]
    fn test_occupancy_flag() {
        let obstacles = vec![
            obstacle(0.0, 0.0),
            obstacle(1.0, 0.0),
            obstacle(2.0, 0.0),
            obstacle(0.0, 5.0),
        ];
        let goals = extract_goal_candidates(&obstacles).unwrap();
        // (1, 0) is parked on, (1, 5) is empty
        assert_eq!(goals.len(), 2);
        assert!(!goals[0].free);
        assert!(goals[1].free);
    }

    #[test]
    fn test_candidates_ordered_x_major() {
        let obstacles = vec![
            obstacle(3.0, 1.0),
            obstacle(0.0, 0.0),
            obstacle(2.0, 0.0),
            obstacle(1.0, 1.0),
        ];
        let goals = extract_goal_candidates(&obstacles).unwrap();
        let coords: Vec<(f64, f64)> = goals.iter().map(|g| (g.x, g.y)).collect();
        assert_eq!(coords, vec![(1.0, 0.0), (1.0, 1.0), (2.0, 0.0), (2.0, 1.0)]);
    }

    #[test]
    fn test_coordinates_snapped_before_grouping() {
        let obstacles = vec![
            obstacle(0.0, 0.0),
            obstacle(1.001, 4.0),
            obstacle(0.999, 0.0),
            obstacle(2.0, 4.0),
        ];
        let goals = extract_goal_candidates(&obstacles).unwrap();
        assert_eq!(goals.len(), 2);
        assert!(goals.iter().all(|g| g.x == 1.0));
        assert!(goals.iter().all(|g| !g.free));
    }

    #[test]
    fn test_empty_obstacles_fail() {
        let err = extract_goal_candidates(&[]).unwrap_err();
        assert!(matches!(err, TrajectoryError::EmptyGoalSet { obstacles: 0 }));
    }

    #[test]
    fn test_two_columns_leave_no_candidates() {
        let obstacles = vec![obstacle(0.0, 0.0), obstacle(1.0, 0.0)];
        assert!(matches!(
            extract_goal_candidates(&obstacles),
            Err(TrajectoryError::EmptyGoalSet { obstacles: 2 })
        ));
    }
}
