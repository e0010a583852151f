//! Known marker placements on the field.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Deserialize;

/// Edge length of the square competition field, in meters.
pub const FIELD_SIZE: f64 = 3.6576;

/// A marker mounted at a known field position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FieldTag {
    /// Marker id as decoded by the camera.
    pub id:     u32,
    /// Field x of the marker center, in meters.
    pub x:      f64,
    /// Field y of the marker center, in meters.
    pub y:      f64,
    /// Height of the marker center above the floor, in meters.
    pub z:      f64,
    /// Direction the marker face points, in radians.
    pub facing: f64,
}

impl FieldTag {
    /// Creates a marker placement.
    pub const fn new(id: u32, x: f64, y: f64, z: f64, facing: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            facing,
        }
    }
}

/// The static set of markers on the field, looked up by id.
///
/// The default map has two markers on each wall of the field, with the origin
/// in the corner where the x and y walls meet.
///
/// ```text
///  +-----------------------------+
///  |      7               8      |
///  | 3                         4 |
///  |                             |
///  | 1                         2 |
///  |      5               6      |
///  +-----------------------------+
/// (0,0)
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldMap {
    tags: Vec<FieldTag>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::new(vec![
            FieldTag::new(1, 0.0, 1.22, 0.15, 0.0),
            FieldTag::new(2, FIELD_SIZE, 1.22, 0.15, PI),
            FieldTag::new(3, 0.0, 2.44, 0.15, 0.0),
            FieldTag::new(4, FIELD_SIZE, 2.44, 0.15, PI),
            FieldTag::new(5, 0.91, 0.0, 0.15, FRAC_PI_2),
            FieldTag::new(6, 2.74, 0.0, 0.15, FRAC_PI_2),
            FieldTag::new(7, 0.91, FIELD_SIZE, 0.15, 3.0 * FRAC_PI_2),
            FieldTag::new(8, 2.74, FIELD_SIZE, 0.15, 3.0 * FRAC_PI_2),
        ])
    }
}

impl FieldMap {
    /// Creates a map from a list of marker placements.
    pub fn new(tags: Vec<FieldTag>) -> Self { Self { tags } }

    /// All markers in the map.
    pub fn tags(&self) -> &[FieldTag] { &self.tags }

    /// Finds the placement of a marker id.
    pub fn get(&self, id: u32) -> Option<&FieldTag> { self.tags.iter().find(|tag| tag.id == id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_has_two_tags_per_wall() {
        let map = FieldMap::default();
        assert_eq!(map.tags().len(), 8);
        let on_wall = |tag: &&FieldTag| {
            tag.x == 0.0 || tag.y == 0.0 || tag.x == FIELD_SIZE || tag.y == FIELD_SIZE
        };
        assert_eq!(map.tags().iter().filter(on_wall).count(), 8);
    }

    #[test]
    fn lookup_by_id() {
        let map = FieldMap::default();
        assert_eq!(map.get(4).map(|tag| tag.x), Some(FIELD_SIZE));
        assert!(map.get(99).is_none());
    }
}
