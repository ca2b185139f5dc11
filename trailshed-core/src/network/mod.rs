//! Reference street network solver for service areas

pub mod components;
mod dijkstra;
pub mod graph;
pub mod solver;


pub use components::{SolverSettings, StreetEdge, StreetNode};
pub use graph::{IndexedPoint, StreetNetwork, StreetNetworkBuilder};
pub use solver::{NetworkSolver, OverlapPolicy, ServiceAreaPolygon, ServiceAreaRequest};
