use pyo3::prelude::*;

use coverage::{PyCoverageReport, extract_source_points, sanitize_name, service_area_coverage};
use network::{PyStreetNetwork, py_load_street_network, solve_service_area};
use pivot::pivot_join;

pub mod coverage;
pub mod network;
pub mod pivot;

/// A Python module implemented in Rust.
#[pymodule]
fn trailshed(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyStreetNetwork>()?;
    m.add_function(wrap_pyfunction!(py_load_street_network, m)?)?;
    m.add_function(wrap_pyfunction!(solve_service_area, m)?)?;

    m.add_function(wrap_pyfunction!(sanitize_name, m)?)?;
    m.add_class::<PyCoverageReport>()?;
    m.add_function(wrap_pyfunction!(extract_source_points, m)?)?;
    m.add_function(wrap_pyfunction!(service_area_coverage, m)?)?;

    m.add_function(wrap_pyfunction!(pivot_join, m)?)?;
    Ok(())
}

/// Configuration problems surface as `ValueError`, everything else as
/// `RuntimeError`.
pub(crate) fn core_error(context: &str, e: &trailshed_core::Error) -> PyErr {
    if e.is_configuration() {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{context}: {e}"))
    } else {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{context}: {e}"))
    }
}

#[cfg(feature = "stubgen")]
pyo3_stub_gen::define_stub_info_gatherer!(stub_info);
