//! The full coverage run: extraction, per-mode solving, aggregation and
//! persistence of every intermediate and final layer.

use log::info;

use super::coverage::{CoverageLayer, aggregate_coverage};
use super::extract::SourcePointExtractor;
use super::service_area::{ServiceAreaRunner, SolveOptions};
use crate::loading::ServiceAreaConfig;
use crate::naming::{NameCollision, sanitize_name};
use crate::network::NetworkSolver;
use crate::store::FeatureStore;
use crate::{Error, FacilitySet, FeatureCollection, SolveFailure};

pub const SERVICE_AREA_PREFIX: &str = "ServiceArea_";
pub const RESULTS_SUFFIX: &str = "Results";
pub const COVERAGE_SUFFIX: &str = "_ServiceArea";

/// A facility set that could not be solved under one travel mode
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub travel_mode: String,
    pub facility_set: String,
    pub failure: SolveFailure,
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// One coverage layer per travel mode, in configuration order
    pub layers: Vec<CoverageLayer>,
    pub failures: Vec<SolveReport>,
    /// Facility set naming collisions, with their resolution
    pub collisions: Vec<NameCollision>,
    /// Names of every collection written to the point store
    pub point_collections: Vec<String>,
}

/// Namespace holding the per-set service areas of a travel mode
pub fn results_namespace(travel_mode: &str) -> String {
    format!("{}{RESULTS_SUFFIX}", sanitize_name(travel_mode))
}

/// Name of the final coverage collection of a travel mode
pub fn coverage_name(travel_mode: &str) -> String {
    format!("{}{COVERAGE_SUFFIX}", sanitize_name(travel_mode))
}

/// Runs the whole analysis.
///
/// Facility sets go to the root of `point_store`. For every travel mode
/// the successful service areas go to `<mode>Results/ServiceArea_<set>`
/// and the coverage layer to `<mode>_ServiceArea`, both in `result_store`.
///
/// # Errors
///
/// Configuration errors (checked before any work), a travel mode the
/// solver does not know, naming collisions under `Abort`, store errors.
/// Failed solves are not errors; they are listed in the report.
pub fn run_service_area_analysis(
    config: &ServiceAreaConfig,
    trails: &FeatureCollection,
    junctions: &FeatureCollection,
    solver: &dyn NetworkSolver,
    point_store: &dyn FeatureStore,
    result_store: &dyn FeatureStore,
) -> Result<AnalysisReport, Error> {
    config.validate()?;
    trails.require_field(&config.naming_field, "trails")?;
    for mode in &config.travel_modes {
        solver.travel_modes().lookup(mode)?;
    }

    let extractor = SourcePointExtractor::new(config.search_distance)
        .with_sanitizer(config.sanitizer())
        .with_collision_policy(config.collision_policy);
    let extraction = extractor.extract(trails, junctions, &config.naming_field)?;
    let point_collections = extractor.persist(&extraction, point_store, "")?;

    let mut report = solve_facility_sets(
        config,
        &extraction.facility_sets,
        trails,
        solver,
        result_store,
    )?;
    report.collisions = extraction.collisions;
    report.point_collections = point_collections;
    Ok(report)
}

/// The solve phase on its own, for facility sets extracted earlier (see
/// [`super::extract::load_facility_sets`]).
///
/// # Errors
///
/// As [`run_service_area_analysis`], minus extraction.
pub fn solve_facility_sets(
    config: &ServiceAreaConfig,
    facility_sets: &[FacilitySet],
    trails: &FeatureCollection,
    solver: &dyn NetworkSolver,
    result_store: &dyn FeatureStore,
) -> Result<AnalysisReport, Error> {
    config.validate()?;
    let cutoffs = config.cutoffs()?;
    let options = SolveOptions {
        overlap: config.overlap,
        timeout: config.solve_timeout(),
    };

    let runners = config
        .travel_modes
        .iter()
        .map(|mode| ServiceAreaRunner::new(solver, mode, &cutoffs, options))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = AnalysisReport::default();
    for runner in &runners {
        let mode = runner.travel_mode().name.clone();
        info!("Solving {} facility sets for '{mode}'", facility_sets.len());

        let results = runner.solve_all(facility_sets, config.parallel);

        let namespace = results_namespace(&mode);
        for result in &results {
            if let Some(polygons) = result.polygons() {
                let name = format!("{SERVICE_AREA_PREFIX}{}", result.facility_set_name);
                result_store.write(&namespace, &name, polygons)?;
            }
        }

        let layer = aggregate_coverage(&mode, &results, trails);
        result_store.write("", &coverage_name(&mode), &layer.features)?;
        info!("Stored coverage of '{mode}' as '{}'", coverage_name(&mode));

        report
            .failures
            .extend(layer.failed_sets.iter().map(|(set, failure)| SolveReport {
                travel_mode: mode.clone(),
                facility_set: set.clone(),
                failure: failure.clone(),
            }));
        report.layers.push(layer);
    }

    Ok(report)
}
