//! Street network components - nodes, edges and solver settings

use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::TravelMode;

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Length in meters
    pub length: f64,
    /// Optional class matched against travel mode restrictions
    pub class: Option<String>,
    /// Geometry oriented from the edge source to its target
    pub geometry: LineString<f64>,
}

impl StreetEdge {
    /// Minutes needed to traverse the edge, `None` if the mode may not use it
    pub fn travel_minutes(&self, mode: &TravelMode) -> Option<f64> {
        mode.allows(self.class.as_deref())
            .then(|| mode.minutes_for(self.length))
    }

    /// Point at `fraction` of the edge length, measured from the source
    /// end, or from the target end when `from_target` is set.
    pub fn point_at(&self, fraction: f64, from_target: bool) -> Point<f64> {
        let fraction = fraction.clamp(0.0, 1.0);
        let fraction = if from_target { 1.0 - fraction } else { fraction };
        point_along(&self.geometry, fraction)
    }
}

fn point_along(line: &LineString<f64>, fraction: f64) -> Point<f64> {
    let total: f64 = line.lines().map(|l| l.dx().hypot(l.dy())).sum();
    let mut remaining = total * fraction;

    for segment in line.lines() {
        let length = segment.dx().hypot(segment.dy());
        if remaining <= length && length > 0.0 {
            let t = remaining / length;
            return Point::from(Coord {
                x: segment.start.x + t * segment.dx(),
                y: segment.start.y + t * segment.dy(),
            });
        }
        remaining -= length;
    }

    line.points()
        .last()
        .or_else(|| line.points().next())
        .unwrap_or_else(|| Point::new(0.0, 0.0))
}

/// Tunables of the street network solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Facilities farther than this from every node are not located
    pub snap_tolerance: f64,
    /// Buffer in meters around reached network locations
    pub polygon_trim: f64,
    /// Vertices used to approximate each trim circle
    pub trim_segments: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 5000.0,
            polygon_trim: 100.0,
            trim_segments: 16,
        }
    }
}
