//! Street network graph with a spatial index of its nodes

use geo::{LineString, MultiLineString, Point};
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::components::{SolverSettings, StreetEdge, StreetNode};
use crate::spatial::overlay::line_length;
use crate::TravelModes;

/// Node location tagged with its graph index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Undirected street graph used by the reference service area solver
#[derive(Debug, Clone)]
pub struct StreetNetwork {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    pub(crate) rtree: RTree<IndexedPoint>,
    pub(crate) modes: TravelModes,
    pub settings: SolverSettings,
}

impl StreetNetwork {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn travel_mode_registry(&self) -> &TravelModes {
        &self.modes
    }

    /// Nearest node to `point` with its Euclidean distance
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        self.rtree
            .nearest_neighbor_iter_with_distance_2(&[point.x(), point.y()])
            .next()
            .map(|(node, distance_2)| (node.data, distance_2.sqrt()))
    }
}

/// Incremental construction of a [`StreetNetwork`]
#[derive(Debug, Default)]
pub struct StreetNetworkBuilder {
    graph: UnGraph<StreetNode, StreetEdge>,
    locator: RTree<IndexedPoint>,
    merge_tolerance: f64,
}

impl StreetNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line endpoints closer than `tolerance` to an existing node are
    /// attached to that node instead of creating a new one.
    #[must_use]
    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance.max(0.0);
        self
    }

    pub fn add_node(&mut self, geometry: Point<f64>) -> NodeIndex {
        let idx = self.graph.add_node(StreetNode { geometry });
        self.locator
            .insert(GeomWithData::new([geometry.x(), geometry.y()], idx));
        idx
    }

    /// Existing node within the merge tolerance of `point`, or a new one
    pub fn node_at(&mut self, point: Point<f64>) -> NodeIndex {
        let existing = self
            .locator
            .nearest_neighbor_iter_with_distance_2(&[point.x(), point.y()])
            .next()
            .filter(|(_, distance_2)| *distance_2 <= self.merge_tolerance * self.merge_tolerance)
            .map(|(node, _)| node.data);
        existing.unwrap_or_else(|| self.add_node(point))
    }

    /// Adds a street between two nodes. Its length is taken from the
    /// geometry, which must run from `from` to `to`.
    pub fn add_street(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        geometry: LineString<f64>,
        class: Option<String>,
    ) {
        let length = line_length(&MultiLineString::new(vec![geometry.clone()]));
        self.graph.add_edge(
            from,
            to,
            StreetEdge {
                length,
                class,
                geometry,
            },
        );
    }

    /// Adds a line as a street between nodes at its endpoints. Degenerate
    /// lines and lines whose ends merge into one node are skipped.
    pub fn add_line(&mut self, geometry: LineString<f64>, class: Option<String>) -> bool {
        let (Some(first), Some(last)) = (geometry.0.first(), geometry.0.last()) else {
            return false;
        };
        let (first, last) = (Point::from(*first), Point::from(*last));
        let from = self.node_at(first);
        let to = self.node_at(last);
        if from == to {
            debug!("Skipping closed or degenerate street at {first:?}");
            return false;
        }
        self.add_street(from, to, geometry, class);
        true
    }

    pub fn build(self, modes: TravelModes, settings: SolverSettings) -> StreetNetwork {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| {
                let point = self.graph[idx].geometry;
                GeomWithData::new([point.x(), point.y()], idx)
            })
            .collect();

        StreetNetwork {
            graph: self.graph,
            rtree: RTree::bulk_load(nodes),
            modes,
            settings,
        }
    }
}
