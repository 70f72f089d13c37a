//! Slot grid geometry for the mole board
//!
//! The board is a fixed, ordered set of hole centers with a shared press
//! radius. The grid never changes during a round; the simulation only asks
//! it which slot (if any) contains a point.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// The fixed board of mole holes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotGrid {
    /// Hole centers in simulation space, in slot-index order
    holes: Vec<Vec2>,
    /// Press-detection radius shared by every hole
    radius: f32,
}

impl SlotGrid {
    pub fn new(holes: Vec<Vec2>, radius: f32) -> Self {
        Self { holes, radius }
    }

    /// Build a rows x cols board with evenly spaced holes
    pub fn layout(cols: usize, rows: usize, origin: Vec2, spacing: f32, radius: f32) -> Self {
        let mut holes = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                holes.push(origin + Vec2::new(col as f32 * spacing, row as f32 * spacing));
            }
        }
        Self { holes, radius }
    }

    /// Number of slots on the board
    #[inline]
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// Press radius around each hole center
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Center of a slot
    #[inline]
    pub fn center(&self, slot: usize) -> Vec2 {
        self.holes[slot]
    }

    /// Check whether a point lands inside a specific slot
    pub fn contains(&self, slot: usize, point: Vec2) -> bool {
        self.holes
            .get(slot)
            .is_some_and(|&c| c.distance_squared(point) <= self.radius * self.radius)
    }

    /// Find the slot containing a point
    ///
    /// Holes never overlap on a sane layout, but if spacing is tighter than
    /// two radii the nearest center wins.
    pub fn slot_at(&self, point: Vec2) -> Option<usize> {
        let r_sq = self.radius * self.radius;
        self.holes
            .iter()
            .enumerate()
            .map(|(i, &c)| (i, c.distance_squared(point)))
            .filter(|&(_, d)| d <= r_sq)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Iterate over hole centers in slot order
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.holes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> SlotGrid {
        SlotGrid::layout(3, 3, Vec2::new(100.0, 100.0), 200.0, 60.0)
    }

    #[test]
    fn test_layout_ordering() {
        let grid = board();
        assert_eq!(grid.len(), 9);
        // Row-major: slot 0 top-left, slot 1 to its right
        assert_eq!(grid.center(0), Vec2::new(100.0, 100.0));
        assert_eq!(grid.center(1), Vec2::new(300.0, 100.0));
        assert_eq!(grid.center(3), Vec2::new(100.0, 300.0));
    }

    #[test]
    fn test_slot_at_inside_and_outside() {
        let grid = board();
        // Dead center of slot 4 (middle hole)
        assert_eq!(grid.slot_at(Vec2::new(300.0, 300.0)), Some(4));
        // Just inside the radius
        assert_eq!(grid.slot_at(Vec2::new(300.0 + 59.0, 300.0)), Some(4));
        // Between holes, outside every radius
        assert_eq!(grid.slot_at(Vec2::new(200.0, 200.0)), None);
        // Far off the board
        assert_eq!(grid.slot_at(Vec2::new(-500.0, -500.0)), None);
    }

    #[test]
    fn test_slot_at_prefers_nearest_on_overlap() {
        // Spacing tighter than two radii: point between holes 0 and 1
        let grid = SlotGrid::layout(2, 1, Vec2::ZERO, 100.0, 80.0);
        assert_eq!(grid.slot_at(Vec2::new(40.0, 0.0)), Some(0));
        assert_eq!(grid.slot_at(Vec2::new(60.0, 0.0)), Some(1));
    }

    #[test]
    fn test_contains_matches_slot_at() {
        let grid = board();
        let p = Vec2::new(310.0, 290.0);
        let slot = grid.slot_at(p).unwrap();
        assert!(grid.contains(slot, p));
        assert!(!grid.contains(0, p));
    }
}
