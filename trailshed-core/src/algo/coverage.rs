//! Merging the service areas of one travel mode and attributing them to
//! trails.

use log::{info, warn};

use super::service_area::{
    FACILITY_ID_FIELD, FACILITY_OID_FIELD, FROM_BREAK_FIELD, NAME_FIELD, ServiceAreaResult,
    TO_BREAK_FIELD,
};
use crate::spatial::join::{JOIN_COUNT_FIELD, TARGET_FID_FIELD, largest_overlap_join};
use crate::{FeatureCollection, SolveFailure};

/// Solver and join fields that carry no meaning once polygons are
/// attributed to trails
pub const BOOKKEEPING_FIELDS: [&str; 7] = [
    NAME_FIELD,
    JOIN_COUNT_FIELD,
    FROM_BREAK_FIELD,
    TO_BREAK_FIELD,
    FACILITY_OID_FIELD,
    FACILITY_ID_FIELD,
    TARGET_FID_FIELD,
];

/// Final coverage of one travel mode
#[derive(Debug, Clone)]
pub struct CoverageLayer {
    pub travel_mode: String,
    /// Service area polygons carrying the attributes of their trail
    pub features: FeatureCollection,
    /// Facility sets whose polygons were merged, in input order
    pub merged_sets: Vec<String>,
    /// Facility sets left out because their solve failed
    pub failed_sets: Vec<(String, SolveFailure)>,
}

/// Successful results of `travel_mode` merged into one collection, with
/// the names of the contributing facility sets and of the failed ones.
pub fn merge_successful(
    travel_mode: &str,
    results: &[ServiceAreaResult],
) -> (FeatureCollection, Vec<String>, Vec<(String, SolveFailure)>) {
    let mut merged_sets = Vec::new();
    let mut failed_sets = Vec::new();
    let mut parts = Vec::new();

    for result in results {
        if result.travel_mode != travel_mode {
            warn!(
                "Ignoring result of '{}' solved for travel mode '{}' while merging '{travel_mode}'",
                result.facility_set_name, result.travel_mode
            );
            continue;
        }
        match &result.outcome {
            Ok(polygons) => {
                parts.push(polygons);
                merged_sets.push(result.facility_set_name.clone());
            }
            Err(failure) => {
                failed_sets.push((result.facility_set_name.clone(), failure.clone()));
            }
        }
    }

    (FeatureCollection::merge(parts), merged_sets, failed_sets)
}

/// Merges the successful solves of one travel mode, attributes every
/// polygon to the trail it overlaps most and strips the bookkeeping
/// fields.
pub fn aggregate_coverage(
    travel_mode: &str,
    results: &[ServiceAreaResult],
    trails: &FeatureCollection,
) -> CoverageLayer {
    let (merged, merged_sets, failed_sets) = merge_successful(travel_mode, results);

    let mut features = largest_overlap_join(&merged, trails);
    features.delete_fields(&BOOKKEEPING_FIELDS);

    info!(
        "{travel_mode}: merged {} service areas, {} facility sets failed",
        merged_sets.len(),
        failed_sets.len()
    );

    CoverageLayer {
        travel_mode: travel_mode.to_string(),
        features,
        merged_sets,
        failed_sets,
    }
}
