use glam::DVec3;

use crate::constants::WAYPOINT_EPSILON;

/// A titled point. Immutable: a rename or move builds a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub fn new(title: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            title: title.into(),
            x,
            y,
            z,
        }
    }

    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Same waypoint with a different title.
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self::new(title, self.x, self.y, self.z)
    }

    /// Exact title match and every coordinate within `WAYPOINT_EPSILON`.
    pub fn approx_eq(&self, other: &Waypoint) -> bool {
        self.title == other.title
            && (self.x - other.x).abs() < WAYPOINT_EPSILON
            && (self.y - other.y).abs() < WAYPOINT_EPSILON
            && (self.z - other.z).abs() < WAYPOINT_EPSILON
    }

    /// Coordinates rounded to two decimals, for confirmations.
    pub fn rounded(&self) -> [f64; 3] {
        let round = |v: f64| (v * 100.0).round() / 100.0;
        [round(self.x), round(self.y), round(self.z)]
    }
}
