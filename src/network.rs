use geo::{Point, Polygon};
use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};
use trailshed_core::prelude::*;
use wkt::{ToWkt, TryFromWkt};

use trailshed_core::network::ServiceAreaRequest;

use crate::core_error;

/// StreetNetwork
///
/// Street graph used to solve service areas. Every street line becomes an
/// edge between the nodes at its endpoints, weighted by travel time for
/// each travel mode.
///
/// Example:
///
/// .. code-block:: python
///
///     network = load_street_network("streets.geojson", "modes.json")
///     print(network.travel_modes())
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "StreetNetwork")]
pub struct PyStreetNetwork {
    pub(crate) inner: StreetNetwork,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyStreetNetwork {
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Names of the travel modes this network can solve for
    pub fn travel_modes(&self) -> Vec<String> {
        self.inner
            .travel_mode_registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "StreetNetwork with {} nodes, {} edges and travel modes [{}]",
            self.inner.node_count(),
            self.inner.edge_count(),
            self.travel_modes().join(", ")
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Load a street network from line features
///
/// Parameters
/// ----------
/// lines_path : str
///     GeoJSON file of street lines, in a projected CRS with meter units
/// travel_modes_path : str
///     JSON list of travel modes: ``name``, ``speed_kmh`` and optional
///     ``restricted_classes``
/// class_field : str, optional
///     Line field matched against the restricted classes of each mode
/// merge_tolerance : float, default=0.5
///     Line endpoints closer than this become one node
/// snap_tolerance : float, default=5000.0
///     Facilities farther than this from every node are not located
/// polygon_trim : float, default=100.0
///     Buffer around reached streets in service area polygons
///
/// Returns
/// -------
/// StreetNetwork
///
/// Raises
/// ------
/// ValueError
///     If the configuration is invalid
/// RuntimeError
///     If the input files cannot be read
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "load_street_network")]
#[pyo3(signature = (
    lines_path,
    travel_modes_path,
    class_field = None,
    merge_tolerance = 0.5,
    snap_tolerance = 5000.0,
    polygon_trim = 100.0
))]
pub fn py_load_street_network(
    py: Python<'_>,
    lines_path: &str,
    travel_modes_path: &str,
    class_field: Option<String>,
    merge_tolerance: f64,
    snap_tolerance: f64,
    polygon_trim: f64,
) -> PyResult<PyStreetNetwork> {
    py.detach(|| {
        let mut config = NetworkConfig::new(lines_path, travel_modes_path);
        config.class_field = class_field;
        config.merge_tolerance = merge_tolerance;
        config.settings = SolverSettings {
            snap_tolerance,
            polygon_trim,
            ..SolverSettings::default()
        };

        let network = trailshed_core::create_street_network(&config)
            .map_err(|e| core_error("Failed to load street network", &e))?;

        Ok(PyStreetNetwork { inner: network })
    })
}

/// Solve one service area around the given facilities
///
/// Parameters
/// ----------
/// network : StreetNetwork
/// facilities : list[str]
///     Facility locations as WKT points
/// travel_mode : str
/// cutoffs : list[float]
///     Travel time breaks in minutes
/// overlap : bool, default=False
///     Keep one polygon per facility and cutoff instead of dissolving
///
/// Returns
/// -------
/// list[str]
///     Service area polygons as WKT
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (network, facilities, travel_mode, cutoffs, overlap = false))]
#[allow(clippy::needless_pass_by_value)]
pub fn solve_service_area(
    py: Python<'_>,
    network: &PyStreetNetwork,
    facilities: Vec<String>,
    travel_mode: &str,
    cutoffs: Vec<f64>,
    overlap: bool,
) -> PyResult<Vec<String>> {
    let points = facilities
        .iter()
        .map(|wkt| Point::try_from_wkt_str(wkt))
        .collect::<Result<Vec<Point<f64>>, _>>()
        .map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Failed to parse facility WKT: {e}"
            ))
        })?;

    py.detach(|| {
        let mode = network
            .inner
            .travel_modes()
            .lookup(travel_mode)
            .map_err(|e| core_error("Failed to solve service area", &e))?;
        let cutoffs =
            Cutoffs::new(cutoffs).map_err(|e| core_error("Failed to solve service area", &e))?;

        let request = ServiceAreaRequest {
            travel_mode: mode,
            cutoffs: &cutoffs,
            facilities: &points,
            overlap: if overlap {
                OverlapPolicy::Overlap
            } else {
                OverlapPolicy::Dissolve
            },
            timeout: None,
        };

        let polygons = network.inner.solve_service_area(&request).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to solve service area: {e}"
            ))
        })?;

        Ok(polygons
            .iter()
            .flat_map(|area| area.geometry.iter())
            .map(|polygon: &Polygon<f64>| polygon.to_wkt().to_string())
            .collect())
    })
}
