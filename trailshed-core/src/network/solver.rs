//! The service area solving capability and its street network implementation

use std::time::{Duration, Instant};

use geo::{Area, ConvexHull, MultiPoint, MultiPolygon, Point, Polygon};
use hashbrown::HashMap;
use log::trace;
use petgraph::{graph::NodeIndex, visit::EdgeRef};
use serde::{Deserialize, Serialize};

use super::StreetNetwork;
use super::dijkstra::dijkstra_path_weights;
use crate::spatial::overlay::{circle_vertices, union_all};
use crate::{Cutoffs, SolveFailure, TravelMode, TravelModeRegistry};

/// How polygons of different facilities and cutoffs relate in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Union everything into one polygon spanning all cutoffs
    #[default]
    Dissolve,
    /// One polygon per facility and cutoff
    Overlap,
}

/// A single, self-contained service area solve
#[derive(Debug, Clone, Copy)]
pub struct ServiceAreaRequest<'a> {
    pub travel_mode: &'a TravelMode,
    pub cutoffs: &'a Cutoffs,
    pub facilities: &'a [Point<f64>],
    pub overlap: OverlapPolicy,
    pub timeout: Option<Duration>,
}

/// One output polygon of a solve
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAreaPolygon {
    /// Position of the facility in the request, `None` once dissolved
    pub facility: Option<usize>,
    pub from_break: f64,
    pub to_break: f64,
    pub geometry: MultiPolygon<f64>,
}

/// Network routing capability consumed by the service area stage
pub trait NetworkSolver: Sync {
    fn travel_modes(&self) -> &dyn TravelModeRegistry;

    /// Solves one request. Infeasible requests are reported as a
    /// [`SolveFailure`], never as a panic or fatal error.
    fn solve_service_area(
        &self,
        request: &ServiceAreaRequest<'_>,
    ) -> Result<Vec<ServiceAreaPolygon>, SolveFailure>;
}

impl NetworkSolver for StreetNetwork {
    fn travel_modes(&self) -> &dyn TravelModeRegistry {
        &self.modes
    }

    fn solve_service_area(
        &self,
        request: &ServiceAreaRequest<'_>,
    ) -> Result<Vec<ServiceAreaPolygon>, SolveFailure> {
        if request.facilities.is_empty() {
            return Err(SolveFailure::NoFacilities);
        }
        let deadline = request.timeout.map(|timeout| Instant::now() + timeout);
        let timed_out = || SolveFailure::TimedOut(request.timeout.unwrap_or_default());

        let located: Vec<(usize, Point<f64>, NodeIndex)> = request
            .facilities
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let (node, distance) = self.nearest_node(point)?;
                if distance <= self.settings.snap_tolerance {
                    Some((idx, *point, node))
                } else {
                    trace!("Facility {idx} is {distance:.1}m from the network, not located");
                    None
                }
            })
            .collect();
        if located.is_empty() {
            return Err(SolveFailure::NoFacilitiesLocated(request.facilities.len()));
        }

        let cutoffs = request.cutoffs.values();
        let mut polygons = Vec::new();
        for (facility, location, node) in located {
            let costs = dijkstra_path_weights(
                self,
                node,
                request.travel_mode,
                request.cutoffs.max(),
                deadline,
            )
            .map_err(|_| timed_out())?;

            for &cutoff in cutoffs {
                if let Some(polygon) =
                    self.reach_polygon(&costs, cutoff, location, request.travel_mode)
                {
                    polygons.push(ServiceAreaPolygon {
                        facility: Some(facility),
                        from_break: 0.0,
                        to_break: cutoff,
                        geometry: MultiPolygon::new(vec![polygon]),
                    });
                }
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(timed_out());
            }
        }

        if polygons.is_empty() {
            return Err(SolveFailure::NothingReachable);
        }

        match request.overlap {
            OverlapPolicy::Overlap => Ok(polygons),
            OverlapPolicy::Dissolve => Ok(vec![ServiceAreaPolygon {
                facility: None,
                from_break: 0.0,
                to_break: request.cutoffs.max(),
                geometry: union_all(polygons.into_iter().map(|p| p.geometry).collect()),
            }]),
        }
    }
}

impl StreetNetwork {
    /// Hull of every network location reachable within `cutoff`, each
    /// widened by the polygon trim. Interpolated points stand in for edges
    /// that are only partly traversed. `None` when no edge is reached.
    fn reach_polygon(
        &self,
        costs: &HashMap<NodeIndex, f64>,
        cutoff: f64,
        facility: Point<f64>,
        mode: &TravelMode,
    ) -> Option<Polygon<f64>> {
        let mut reached = vec![facility];
        let mut traversed = false;

        for (&node, &cost) in costs {
            if cost > cutoff {
                continue;
            }
            reached.push(self.graph[node].geometry);

            for edge in self.graph.edges(node) {
                let Some(minutes) = edge.weight().travel_minutes(mode) else {
                    continue;
                };
                traversed = true;
                if cost + minutes > cutoff {
                    let fraction = if minutes > 0.0 {
                        (cutoff - cost) / minutes
                    } else {
                        1.0
                    };
                    let from_target = self
                        .graph
                        .edge_endpoints(edge.id())
                        .is_some_and(|(source, _)| source != node);
                    reached.push(edge.weight().point_at(fraction, from_target));
                }
            }
        }

        if !traversed {
            return None;
        }

        let trim = self.settings.polygon_trim;
        let segments = self.settings.trim_segments.max(3);
        let outline: MultiPoint<f64> = if trim > 0.0 {
            reached
                .iter()
                .flat_map(|point| circle_vertices(*point, trim, segments))
                .map(Point::from)
                .collect()
        } else {
            reached.into()
        };

        let hull = outline.convex_hull();
        (hull.unsigned_area() > 0.0).then_some(hull)
    }
}
