use std::path::Path;

use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};
use trailshed_core::algo::AnalysisReport;
use trailshed_core::naming::{CollisionPolicy, CollisionResolution, NameSanitizer};
use trailshed_core::prelude::{
    GeoJsonStore, OverlapPolicy, ServiceAreaConfig, SourcePointExtractor, parse_travel_modes,
};
use trailshed_core::store::read_geojson;

use crate::core_error;
use crate::network::PyStreetNetwork;

/// CoverageReport
///
/// Summary of a service area coverage run: the coverage layers written to
/// the result folder, the facility sets that could not be solved and the
/// trail names that collided after sanitizing.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "CoverageReport")]
pub struct PyCoverageReport {
    /// Coverage collection names, one per travel mode
    #[pyo3(get)]
    pub layers: Vec<String>,
    /// ``(travel_mode, facility_set, reason)`` of every failed solve
    #[pyo3(get)]
    pub failures: Vec<(String, String, String)>,
    /// ``(trail_name, identifier)`` of every naming collision
    #[pyo3(get)]
    pub collisions: Vec<(String, String)>,
    /// Facility set collections written to the point folder
    #[pyo3(get)]
    pub point_collections: Vec<String>,
}

impl From<AnalysisReport> for PyCoverageReport {
    fn from(report: AnalysisReport) -> Self {
        Self {
            layers: report
                .layers
                .iter()
                .map(|layer| trailshed_core::algo::coverage_name(&layer.travel_mode))
                .collect(),
            failures: report
                .failures
                .into_iter()
                .map(|f| (f.travel_mode, f.facility_set, f.failure.to_string()))
                .collect(),
            collisions: report
                .collisions
                .into_iter()
                .map(|c| {
                    let name = match c.resolution {
                        CollisionResolution::Renamed(name) => name,
                        CollisionResolution::Overwritten => c.name,
                    };
                    (c.raw, name)
                })
                .collect(),
            point_collections: report.point_collections,
        }
    }
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyCoverageReport {
    fn __repr__(&self) -> String {
        format!(
            "CoverageReport with {} layers, {} failed solves and {} name collisions",
            self.layers.len(),
            self.failures.len(),
            self.collisions.len()
        )
    }
}

/// Turn a value into a valid identifier
///
/// Characters other than ASCII letters and digits become underscores, runs
/// of underscores collapse into one, a leading digit gets an ``n_`` prefix
/// and the result is cut to ``max_len`` characters.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (raw, max_len = trailshed_core::DEFAULT_MAX_IDENTIFIER_LEN))]
pub fn sanitize_name(raw: &str, max_len: usize) -> String {
    NameSanitizer::new(max_len).sanitize(raw)
}

fn collision_policy(name: &str) -> PyResult<CollisionPolicy> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).map_err(|_| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Unknown collision policy '{name}', expected overwrite, disambiguate or abort"
        ))
    })
}

fn read_layer(path: &str, what: &str) -> PyResult<trailshed_core::FeatureCollection> {
    read_geojson(Path::new(path)).map_err(|e| core_error(&format!("Failed to read {what}"), &e))
}

/// Select the junctions near every trail and write one point layer per
/// trail
///
/// Parameters
/// ----------
/// trails_path : str
///     GeoJSON file of trail lines
/// naming_field : str
///     Trail field the point layers are named after
/// junctions_path : str
///     GeoJSON file of junction points
/// search_distance : float
///     Junctions at most this far from a trail belong to it
/// point_folder : str
///     Folder receiving ``<name>_source.geojson`` per trail
/// collision_policy : str, default="disambiguate"
///     ``overwrite``, ``disambiguate`` or ``abort`` for trails whose names
///     sanitize to the same identifier
///
/// Returns
/// -------
/// list[str]
///     Names of the written point layers
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (
    trails_path,
    naming_field,
    junctions_path,
    search_distance,
    point_folder,
    collision_policy = "disambiguate"
))]
pub fn extract_source_points(
    py: Python<'_>,
    trails_path: &str,
    naming_field: &str,
    junctions_path: &str,
    search_distance: f64,
    point_folder: &str,
    collision_policy: &str,
) -> PyResult<Vec<String>> {
    let policy = self::collision_policy(collision_policy)?;

    py.detach(|| {
        let trails = read_layer(trails_path, "trails")?;
        let junctions = read_layer(junctions_path, "junctions")?;

        let extractor =
            SourcePointExtractor::new(search_distance).with_collision_policy(policy);
        let extraction = extractor
            .extract(&trails, &junctions, naming_field)
            .map_err(|e| core_error("Failed to extract source points", &e))?;

        let store = GeoJsonStore::new(point_folder);
        extractor
            .persist(&extraction, &store, "")
            .map_err(|e| core_error("Failed to write source points", &e))
    })
}

/// Compute service area coverage of every trail for every travel mode
///
/// For each trail, the junctions within ``search_distance`` become the
/// facilities of a service area solve. The service areas of one travel mode
/// are merged, each polygon takes the attributes of the trail it overlaps
/// most, and the result is written as ``<mode>_ServiceArea.geojson``.
///
/// Parameters
/// ----------
/// network : StreetNetwork
/// trails_path : str
///     GeoJSON file of trail lines
/// naming_field : str
///     Trail field the facility sets are named after
/// junctions_path : str
///     GeoJSON file of junction points
/// search_distance : float
///     Junctions at most this far from a trail belong to it
/// travel_modes : str
///     Semicolon separated travel mode names, e.g. ``"Walking;Cycling"``
/// cutoffs : list[float]
///     Travel time breaks in minutes
/// point_folder : str
///     Folder receiving the facility point layers
/// result_folder : str
///     Folder receiving per-trail service areas and the coverage layers
/// overlap : bool, default=False
///     Keep one polygon per facility and cutoff instead of dissolving
/// parallel : bool, default=True
///     Solve the trails of a travel mode in parallel
/// timeout : float, optional
///     Upper bound in seconds for a single solve
///
/// Returns
/// -------
/// CoverageReport
///
/// Notes
/// -----
/// The function releases the GIL during processing to allow other Python
/// threads to continue execution.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (
    network,
    trails_path,
    naming_field,
    junctions_path,
    search_distance,
    travel_modes,
    cutoffs,
    point_folder,
    result_folder,
    overlap = false,
    parallel = true,
    timeout = None
))]
#[allow(clippy::too_many_arguments)]
pub fn service_area_coverage(
    py: Python<'_>,
    network: &PyStreetNetwork,
    trails_path: &str,
    naming_field: &str,
    junctions_path: &str,
    search_distance: f64,
    travel_modes: &str,
    cutoffs: Vec<f64>,
    point_folder: &str,
    result_folder: &str,
    overlap: bool,
    parallel: bool,
    timeout: Option<f64>,
) -> PyResult<PyCoverageReport> {
    let mut config = ServiceAreaConfig::new(
        naming_field,
        search_distance,
        parse_travel_modes(travel_modes),
        cutoffs,
    );
    config.overlap = if overlap {
        OverlapPolicy::Overlap
    } else {
        OverlapPolicy::Dissolve
    };
    config.parallel = parallel;
    config.solve_timeout_secs = timeout;

    py.detach(|| {
        let trails = read_layer(trails_path, "trails")?;
        let junctions = read_layer(junctions_path, "junctions")?;

        let report = trailshed_core::run_service_area_analysis(
            &config,
            &trails,
            &junctions,
            &network.inner,
            &GeoJsonStore::new(point_folder),
            &GeoJsonStore::new(result_folder),
        )
        .map_err(|e| core_error("Failed to compute service area coverage", &e))?;

        Ok(PyCoverageReport::from(report))
    })
}
