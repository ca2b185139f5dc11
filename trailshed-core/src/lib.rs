//! Network service area coverage for trail segments, and pivoted point
//! counts on polygons.
//!
//! The coverage pipeline runs in three stages:
//!
//! 1. [`algo::extract`] selects, for every trail segment, the junction
//!    points within a search distance and names the resulting facility set
//!    after the trail.
//! 2. [`algo::service_area`] solves a service area per facility set and
//!    travel mode against a [`network::NetworkSolver`].
//! 3. [`algo::coverage`] merges the successful solves of each travel mode
//!    and attributes every polygon to the trail it overlaps most.
//!
//! [`algo::pivot`] is an independent tool that counts points per polygon
//! and category and joins the counts back as one field per category.

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod naming;
pub mod network;
pub mod prelude;
pub mod spatial;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{Error, SolveFailure};
pub use model::{
    AttributeValue, Attributes, Cutoffs, FACILITY_SUFFIX, FacilitySet, Feature,
    FeatureCollection, JunctionPoint, TrailSegment, TravelMode, TravelModeRegistry, TravelModes,
};

pub use algo::pipeline::run_service_area_analysis;
pub use loading::create_street_network;

/// Longest identifier the naming rules produce unless configured otherwise
pub const DEFAULT_MAX_IDENTIFIER_LEN: usize = 64;
