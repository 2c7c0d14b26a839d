//! Continuous enemy positions along the level path.
//!
//! Progress is measured in segment-index space: `progress * segment_count`
//! yields the segment an enemy is on plus the fraction of that segment it
//! has covered. Movement itself is expressed in world units, so enemies keep
//! a constant physical speed even though long and short segments consume the
//! same share of progress.

use glam::Vec2;
use path_defence_core::LevelLayout;

/// Result of moving along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStep {
    /// Position reached in world units.
    pub position: Vec2,
    /// Normalised progress reached, within `[0, 1]`.
    pub progress: f32,
}

/// Polyline walked by every enemy of a level.
#[derive(Clone, Debug, PartialEq)]
pub struct PathTracker {
    points: Vec<Vec2>,
}

impl PathTracker {
    /// Creates a tracker walking the provided world-space points in order.
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Creates a tracker through the centers of the level's waypoint cells.
    #[must_use]
    pub fn from_level(level: &LevelLayout) -> Self {
        Self::new(
            level
                .waypoints
                .iter()
                .map(|cell| level.cell_center(*cell))
                .collect(),
        )
    }

    /// Number of segments between consecutive points.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Position where enemies enter.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.points.first().copied().unwrap_or(Vec2::ZERO)
    }

    /// Position where enemies escape.
    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.points.last().copied().unwrap_or(Vec2::ZERO)
    }

    /// Resolves a progress value into a position without moving.
    #[must_use]
    pub fn position_at(&self, progress: f32) -> Vec2 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.start();
        }
        if progress >= 1.0 {
            return self.end();
        }

        let coordinate = progress.max(0.0) * segments as f32;
        let index = (coordinate.floor() as usize).min(segments - 1);
        let offset = coordinate - index as f32;
        self.points[index].lerp(self.points[index + 1], offset)
    }

    /// Moves `distance` world units forward from `progress`.
    ///
    /// Zero-length segments are skipped. Running past the final point
    /// returns the end of the path with progress `1.0`; a path without
    /// segments always returns its single point with progress `0.0`.
    #[must_use]
    pub fn advance(&self, progress: f32, distance: f32) -> PathStep {
        let segments = self.segment_count();
        if segments == 0 {
            return PathStep {
                position: self.start(),
                progress: 0.0,
            };
        }

        let progress = progress.clamp(0.0, 1.0);
        if distance.is_nan() || distance <= 0.0 {
            return PathStep {
                position: self.position_at(progress),
                progress,
            };
        }

        let coordinate = progress * segments as f32;
        let mut index = coordinate.floor() as usize;
        let mut offset = coordinate - index as f32;
        let mut remaining = distance;

        while index < segments {
            let start = self.points[index];
            let end = self.points[index + 1];
            let length = start.distance(end);

            if length == 0.0 {
                index += 1;
                offset = 0.0;
                continue;
            }

            let to_segment_end = length * (1.0 - offset);
            if remaining <= to_segment_end {
                let offset = offset + remaining / length;
                let progress = ((index as f32 + offset) / segments as f32).min(1.0);
                return PathStep {
                    position: start.lerp(end, offset),
                    progress,
                };
            }

            remaining -= to_segment_end;
            index += 1;
            offset = 0.0;
        }

        PathStep {
            position: self.end(),
            progress: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(points: &[(f32, f32)]) -> PathTracker {
        PathTracker::new(points.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
    }

    #[test]
    fn advance_interpolates_within_a_segment() {
        let path = tracker(&[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0)]);

        let step = path.advance(0.0, 40.0);

        assert!((step.position - Vec2::new(40.0, 0.0)).length() < 1e-4);
        assert!((step.progress - 0.2).abs() < 1e-6);
    }

    #[test]
    fn advance_crosses_segment_boundaries() {
        let path = tracker(&[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0)]);

        let step = path.advance(0.0, 125.0);

        assert!((step.position - Vec2::new(100.0, 25.0)).length() < 1e-4);
        assert!((step.progress - 0.75).abs() < 1e-6);
    }

    #[test]
    fn progress_is_segment_indexed_not_arc_length() {
        let path = tracker(&[(0.0, 0.0), (10.0, 0.0), (110.0, 0.0)]);

        let step = path.advance(0.0, 10.0);

        assert!((step.progress - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_keeps_position_and_progress() {
        let path = tracker(&[(0.0, 0.0), (100.0, 0.0)]);
        let moved = path.advance(0.0, 30.0);

        let stay = path.advance(moved.progress, 0.0);

        assert_eq!(stay.progress, moved.progress);
        assert!((stay.position - moved.position).length() < 1e-4);
    }

    #[test]
    fn overshooting_returns_end_with_full_progress() {
        let path = tracker(&[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0)]);

        let step = path.advance(0.5, 1_000.0);

        assert_eq!(step.position, Vec2::new(100.0, 50.0));
        assert_eq!(step.progress, 1.0);
    }

    #[test]
    fn single_point_path_never_moves() {
        let path = tracker(&[(20.0, 20.0)]);

        for _ in 0..3 {
            let step = path.advance(0.0, 15.0);
            assert_eq!(step.position, Vec2::new(20.0, 20.0));
            assert_eq!(step.progress, 0.0);
        }
    }

    #[test]
    fn empty_path_returns_origin() {
        let path = tracker(&[]);
        let step = path.advance(0.3, 15.0);
        assert_eq!(step.position, Vec2::ZERO);
        assert_eq!(step.progress, 0.0);
    }

    #[test]
    fn duplicated_waypoints_are_skipped_without_stalling() {
        let path = tracker(&[(0.0, 0.0), (50.0, 0.0), (50.0, 0.0), (50.0, 50.0)]);
        let mut progress = 0.0;
        let mut steps = 0;

        while progress < 1.0 {
            let step = path.advance(progress, 7.0);
            assert!(step.position.is_finite(), "position must stay finite");
            assert!(step.progress >= progress, "progress must not decrease");
            assert!(step.progress <= 1.0);
            progress = step.progress;
            steps += 1;
            assert!(steps < 100, "walk must terminate");
        }

        assert_eq!(path.advance(progress, 7.0).position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn progress_is_monotonic_for_mixed_distances() {
        let path = tracker(&[(0.0, 0.0), (30.0, 0.0), (30.0, 90.0), (0.0, 90.0)]);
        let distances = [0.0, 3.5, 12.0, 0.0, 29.0, 1.0, 45.0, 80.0, 5.0];
        let mut progress = 0.0;

        for distance in distances {
            let step = path.advance(progress, distance);
            assert!(step.progress >= progress);
            assert!((0.0..=1.0).contains(&step.progress));
            progress = step.progress;
        }
    }

    #[test]
    fn position_at_matches_advance() {
        let path = tracker(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
        let step = path.advance(0.0, 150.0);
        assert!((path.position_at(step.progress) - step.position).length() < 1e-3);
    }
}
