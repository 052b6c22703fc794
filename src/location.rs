//! Pure geometry over fleet coordinates.
//!
//! Everything here is a stateless function; the configured [`Bounds`]
//! predicate is passed in by the caller rather than read from shared state.

use serde::{Deserialize, Serialize};

use crate::config::Bounds;
use crate::error::{FleetError, Result};

/// A point in the deployment plane. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Build a position, rejecting non-finite coordinates.
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(FleetError::Validation(format!(
                "coordinates must be finite, got ({x}, {y})"
            )));
        }
        Ok(Self { x, y })
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn check(p: Position) -> Result<()> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(FleetError::InvalidPosition { x: p.x, y: p.y })
    }
}

/// Euclidean distance between two positions.
pub fn distance(a: Position, b: Position) -> Result<f64> {
    check(a)?;
    check(b)?;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    Ok((dx * dx + dy * dy).sqrt())
}

/// Manhattan distance between two positions.
pub fn manhattan_distance(a: Position, b: Position) -> Result<f64> {
    check(a)?;
    check(b)?;
    Ok((b.x - a.x).abs() + (b.y - a.y).abs())
}

/// Validity predicate: finite coordinates, and inside `bounds` when one is
/// configured.
pub fn is_within(p: Position, bounds: Option<&Bounds>) -> bool {
    p.is_finite() && bounds.map_or(true, |b| b.contains(p.x, p.y))
}

/// The candidate closest to `origin`. Ties resolve to the lowest id, so the
/// result is deterministic for a given candidate set. `None` when
/// `candidates` is empty.
pub fn nearest<I>(origin: Position, candidates: &[(I, Position)]) -> Result<Option<I>>
where
    I: Ord + Clone,
{
    let mut best: Option<(f64, &I)> = None;
    for (id, pos) in candidates {
        let d = distance(origin, *pos)?;
        best = match best {
            None => Some((d, id)),
            Some((best_d, best_id)) => {
                if d < best_d || (d == best_d && id < best_id) {
                    Some((d, id))
                } else {
                    Some((best_d, best_id))
                }
            }
        };
    }
    Ok(best.map(|(_, id)| id.clone()))
}

/// All candidates within `radius` of `center`, paired with their distance
/// and sorted nearest-first.
pub fn within_radius<I>(
    center: Position,
    candidates: &[(I, Position)],
    radius: f64,
) -> Result<Vec<(I, f64)>>
where
    I: Clone,
{
    let mut hits = Vec::new();
    for (id, pos) in candidates {
        let d = distance(center, *pos)?;
        if d <= radius {
            hits.push((id.clone(), d));
        }
    }
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(hits)
}

/// Arithmetic mean of a set of positions. `None` when empty.
pub fn centroid(positions: &[Position]) -> Option<Position> {
    if positions.is_empty() {
        return None;
    }
    let n = positions.len() as f64;
    let x = positions.iter().map(|p| p.x).sum::<f64>() / n;
    let y = positions.iter().map(|p| p.y).sum::<f64>() / n;
    Some(Position { x, y })
}

/// Estimated travel time for `dist` at `speed` units per second.
pub fn travel_time(dist: f64, speed: f64) -> Result<f64> {
    if speed <= 0.0 {
        return Err(FleetError::Validation(format!(
            "speed must be positive, got {speed}"
        )));
    }
    Ok(dist / speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_rejects_non_finite() {
        assert!(Position::new(f64::NAN, 0.0).is_err());
        assert!(Position::new(0.0, f64::INFINITY).is_err());
        assert!(Position::new(-3.5, 7.0).is_ok());
    }

    #[test]
    fn euclidean_distance() {
        let a = Position::new(0.0, 0.0).unwrap();
        let b = Position::new(3.0, 4.0).unwrap();
        assert_eq!(distance(a, b).unwrap(), 5.0);
        assert_eq!(distance(b, a).unwrap(), 5.0);
    }

    #[test]
    fn manhattan() {
        let a = Position::new(0.0, 0.0).unwrap();
        let b = Position::new(3.0, 4.0).unwrap();
        assert_eq!(manhattan_distance(a, b).unwrap(), 7.0);
    }

    #[test]
    fn distance_rejects_invalid_position() {
        let a = Position { x: f64::NAN, y: 0.0 };
        let b = Position { x: 1.0, y: 1.0 };
        assert!(matches!(
            distance(a, b),
            Err(FleetError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn is_within_bounds() {
        let p = Position::new(-5.0, 5.0).unwrap();
        assert!(is_within(p, None));
        assert!(is_within(p, Some(&Bounds::symmetric(10.0))));
        assert!(!is_within(p, Some(&Bounds::new(0.0, 10.0, 0.0, 10.0))));
    }

    #[test]
    fn nearest_picks_minimum_distance() {
        let origin = Position::new(5.0, 5.0).unwrap();
        let candidates = vec![
            ("a".to_string(), Position::new(0.0, 0.0).unwrap()),
            ("b".to_string(), Position::new(1.0, 1.0).unwrap()),
        ];
        assert_eq!(nearest(origin, &candidates).unwrap(), Some("b".to_string()));
    }

    #[test]
    fn nearest_tie_breaks_on_lowest_id() {
        let origin = Position::new(0.0, 0.0).unwrap();
        let candidates = vec![
            ("r2".to_string(), Position::new(1.0, 0.0).unwrap()),
            ("r1".to_string(), Position::new(0.0, 1.0).unwrap()),
            ("r3".to_string(), Position::new(-1.0, 0.0).unwrap()),
        ];
        // All at distance 1; repeated calls agree and pick the lowest id.
        for _ in 0..3 {
            assert_eq!(nearest(origin, &candidates).unwrap(), Some("r1".to_string()));
        }
    }

    #[test]
    fn nearest_empty_is_none() {
        let origin = Position::new(0.0, 0.0).unwrap();
        let candidates: Vec<(String, Position)> = Vec::new();
        assert_eq!(nearest(origin, &candidates).unwrap(), None);
    }

    #[test]
    fn within_radius_sorted_by_distance() {
        let center = Position::new(0.0, 0.0).unwrap();
        let candidates = vec![
            ("far".to_string(), Position::new(6.0, 8.0).unwrap()),
            ("near".to_string(), Position::new(1.0, 0.0).unwrap()),
            ("mid".to_string(), Position::new(3.0, 4.0).unwrap()),
        ];
        let hits = within_radius(center, &candidates, 5.0).unwrap();
        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[test]
    fn centroid_of_positions() {
        let positions = vec![
            Position::new(0.0, 0.0).unwrap(),
            Position::new(4.0, 0.0).unwrap(),
            Position::new(2.0, 6.0).unwrap(),
        ];
        let c = centroid(&positions).unwrap();
        assert_eq!(c.x, 2.0);
        assert_eq!(c.y, 2.0);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn travel_time_requires_positive_speed() {
        assert_eq!(travel_time(10.0, 2.0).unwrap(), 5.0);
        assert!(travel_time(10.0, 0.0).is_err());
        assert!(travel_time(10.0, -1.0).is_err());
    }
}
