//! Polygon overlay helpers: overlap measures and unions

use std::f64::consts::TAU;

use geo::{
    Area, BooleanOps, Coord, Geometry, Intersects, LineString, MultiLineString, MultiPolygon,
    Point,
};

/// Polygonal part of a geometry, `None` for points and lines
pub fn to_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

/// Linear part of a geometry, `None` for points and polygons
pub fn to_multi_line(geometry: &Geometry<f64>) -> Option<MultiLineString<f64>> {
    match geometry {
        Geometry::Line(l) => Some(MultiLineString::new(vec![LineString::from(*l)])),
        Geometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => Some(mls.clone()),
        _ => None,
    }
}

pub fn line_length(lines: &MultiLineString<f64>) -> f64 {
    lines
        .iter()
        .flat_map(|ls| ls.lines())
        .map(|line| line.dx().hypot(line.dy()))
        .sum()
}

/// Size of the part of `join` that falls inside `target`.
///
/// Polygons are measured by intersection area, lines by the length inside
/// the target and points by how many of them the target contains.
pub fn overlap_measure(target: &MultiPolygon<f64>, join: &Geometry<f64>) -> f64 {
    if let Some(polygons) = to_multi_polygon(join) {
        return target.intersection(&polygons).unsigned_area();
    }
    if let Some(lines) = to_multi_line(join) {
        return line_length(&target.clip(&lines, false));
    }
    match join {
        Geometry::Point(p) => f64::from(u8::from(target.intersects(p))),
        #[allow(clippy::cast_precision_loss)]
        Geometry::MultiPoint(mp) => mp.iter().filter(|p| target.intersects(*p)).count() as f64,
        _ => 0.0,
    }
}

/// Unions polygons pairwise, round by round, which keeps the operands of
/// each union balanced in size.
pub fn union_all(polygons: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let mut current = polygons;
    if current.is_empty() {
        return MultiPolygon::new(vec![]);
    }

    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        let mut pairs = current.chunks_exact(2);
        for pair in pairs.by_ref() {
            next.push(pair[0].union(&pair[1]));
        }
        if let [last] = pairs.remainder() {
            next.push(last.clone());
        }
        current = next;
    }

    current.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Vertices of a regular polygon approximating a circle
pub fn circle_vertices(center: Point<f64>, radius: f64, segments: usize) -> Vec<Coord<f64>> {
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / segments as f64;
    (0..segments)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f64;
            Coord {
                x: center.x() + radius * angle.cos(),
                y: center.y() + radius * angle.sin(),
            }
        })
        .collect()
}
