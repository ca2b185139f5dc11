//! R-tree nodes for the spatial queries of the pipeline.
//!
//! Trails are indexed segment by segment so a radius query around a point
//! returns every trail within exact Euclidean distance. Polygons and other
//! extended features are indexed by their bounding rectangles and refined
//! with exact predicates afterwards.

use geo::{BoundingRect, Distance, Euclidean, Geometry, Line, MultiLineString, Point};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// Bounding rectangle of a feature tagged with the feature position
pub type EnvelopeNode = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// One straight piece of a trail, tagged with the trail position
#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub owner: usize,
    pub segment: Line<f64>,
    aabb: AABB<[f64; 2]>,
}

impl SegmentNode {
    pub fn new(owner: usize, segment: Line<f64>) -> Self {
        let aabb = AABB::from_corners(
            [segment.start.x, segment.start.y],
            [segment.end.x, segment.end.y],
        );
        Self {
            owner,
            segment,
            aabb,
        }
    }
}

impl RTreeObject for SegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for SegmentNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        Euclidean
            .distance(&Point::new(point[0], point[1]), &self.segment)
            .powi(2)
    }
}

/// Index over the segments of many multi-lines
pub struct SegmentIndex {
    tree: RTree<SegmentNode>,
}

impl SegmentIndex {
    pub fn new<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a MultiLineString<f64>>,
    {
        let nodes = lines
            .into_iter()
            .enumerate()
            .flat_map(|(owner, mls)| {
                mls.iter()
                    .flat_map(|ls| ls.lines())
                    .map(move |segment| SegmentNode::new(owner, segment))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    /// Positions of the lines whose distance to `point` is at most
    /// `distance`, ascending and without duplicates.
    pub fn owners_within(&self, point: Point<f64>, distance: f64) -> Vec<usize> {
        let mut owners: Vec<usize> = self
            .tree
            .locate_within_distance([point.x(), point.y()], distance * distance)
            .map(|node| node.owner)
            .collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Index of feature bounding rectangles. Features without an extent
/// (empty geometries) are left out.
pub fn envelope_index<'a, I>(geometries: I) -> RTree<EnvelopeNode>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    let nodes = geometries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, geometry)| {
            let rect = geometry.bounding_rect()?;
            let corners = Rectangle::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            );
            Some(GeomWithData::new(corners, idx))
        })
        .collect();
    RTree::bulk_load(nodes)
}

/// Candidate positions whose rectangles intersect the extent of `geometry`
pub fn candidates(tree: &RTree<EnvelopeNode>, geometry: &Geometry<f64>) -> Vec<usize> {
    let Some(rect) = geometry.bounding_rect() else {
        return Vec::new();
    };
    let query = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
    let mut found: Vec<usize> = tree
        .locate_in_envelope_intersecting(&query)
        .map(|node| node.data)
        .collect();
    found.sort_unstable();
    found
}
