//! Service area solving per facility set.
//!
//! Every solve builds its own [`ServiceAreaRequest`]; nothing about one
//! facility set's solve is visible to another, so the sets of a travel
//! mode can be solved on the rayon pool.

use std::time::Duration;

use geo::Geometry;
use log::{debug, warn};
use rayon::prelude::*;

use crate::network::{NetworkSolver, OverlapPolicy, ServiceAreaPolygon, ServiceAreaRequest};
use crate::{
    AttributeValue, Attributes, Cutoffs, Error, FacilitySet, FeatureCollection, SolveFailure,
    TravelMode,
};

pub const NAME_FIELD: &str = "Name";
pub const FACILITY_ID_FIELD: &str = "FacilityID";
pub const FACILITY_OID_FIELD: &str = "FacilityOID";
pub const FROM_BREAK_FIELD: &str = "FromBreak";
pub const TO_BREAK_FIELD: &str = "ToBreak";

/// Per-solve settings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveOptions {
    pub overlap: OverlapPolicy,
    pub timeout: Option<Duration>,
}

/// Outcome of solving one facility set under one travel mode
#[derive(Debug, Clone)]
pub struct ServiceAreaResult {
    pub facility_set_name: String,
    pub travel_mode: String,
    /// Polygon features with the solver bookkeeping fields, or the reason
    /// the solve failed
    pub outcome: Result<FeatureCollection, SolveFailure>,
}

impl ServiceAreaResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn polygons(&self) -> Option<&FeatureCollection> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&SolveFailure> {
        self.outcome.as_ref().err()
    }
}

/// Solves facility sets against one travel mode and one set of cutoffs
pub struct ServiceAreaRunner<'a> {
    solver: &'a dyn NetworkSolver,
    travel_mode: &'a TravelMode,
    cutoffs: &'a Cutoffs,
    options: SolveOptions,
}

impl<'a> ServiceAreaRunner<'a> {
    /// # Errors
    ///
    /// `UnknownTravelMode` when the solver does not know `travel_mode`.
    pub fn new(
        solver: &'a dyn NetworkSolver,
        travel_mode: &str,
        cutoffs: &'a Cutoffs,
        options: SolveOptions,
    ) -> Result<Self, Error> {
        let travel_mode = solver.travel_modes().lookup(travel_mode)?;
        Ok(Self {
            solver,
            travel_mode,
            cutoffs,
            options,
        })
    }

    pub fn travel_mode(&self) -> &TravelMode {
        self.travel_mode
    }

    /// Solves a single facility set. Failures are returned inside the
    /// result, never raised.
    pub fn solve(&self, facility_set: &FacilitySet) -> ServiceAreaResult {
        let facilities = facility_set.locations();
        let request = ServiceAreaRequest {
            travel_mode: self.travel_mode,
            cutoffs: self.cutoffs,
            facilities: &facilities,
            overlap: self.options.overlap,
            timeout: self.options.timeout,
        };

        let outcome = self
            .solver
            .solve_service_area(&request)
            .map(|polygons| to_features(facility_set, &polygons));

        match &outcome {
            Ok(features) => debug!(
                "Solved '{}' ({}): {} polygons",
                facility_set.name,
                self.travel_mode.name,
                features.len()
            ),
            Err(failure) => warn!(
                "Service area for '{}' ({}) not solved: {failure}",
                facility_set.name, self.travel_mode.name
            ),
        }

        ServiceAreaResult {
            facility_set_name: facility_set.name.clone(),
            travel_mode: self.travel_mode.name.clone(),
            outcome,
        }
    }

    /// Solves every set, in input order. With `parallel` the sets are
    /// distributed over the rayon pool.
    pub fn solve_all(&self, facility_sets: &[FacilitySet], parallel: bool) -> Vec<ServiceAreaResult> {
        if parallel {
            facility_sets.par_iter().map(|set| self.solve(set)).collect()
        } else {
            facility_sets.iter().map(|set| self.solve(set)).collect()
        }
    }
}

fn to_features(facility_set: &FacilitySet, polygons: &[ServiceAreaPolygon]) -> FeatureCollection {
    let mut features = FeatureCollection::with_fields([
        NAME_FIELD,
        FACILITY_ID_FIELD,
        FACILITY_OID_FIELD,
        FROM_BREAK_FIELD,
        TO_BREAK_FIELD,
    ]);

    for polygon in polygons {
        let mut attributes = Attributes::new();
        attributes.insert(
            NAME_FIELD.to_string(),
            AttributeValue::from(format!(
                "{} : {} - {}",
                facility_set.name, polygon.from_break, polygon.to_break
            )),
        );
        if let Some(facility) = polygon.facility {
            attributes.insert(FACILITY_ID_FIELD.to_string(), AttributeValue::from(facility + 1));
            if let Some(point) = facility_set.points.get(facility) {
                attributes.insert(FACILITY_OID_FIELD.to_string(), AttributeValue::from(point.fid));
            }
        }
        attributes.insert(
            FROM_BREAK_FIELD.to_string(),
            AttributeValue::from(polygon.from_break),
        );
        attributes.insert(TO_BREAK_FIELD.to_string(), AttributeValue::from(polygon.to_break));

        features.push(Geometry::MultiPolygon(polygon.geometry.clone()), attributes);
    }

    features
}
