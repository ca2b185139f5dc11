use std::fs::File;
use std::path::Path;

use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::gen_stub_pyfunction;
use trailshed_core::algo::{PivotOptions, aggregate_points_in_place, build_pivot_table};
use trailshed_core::store::{read_geojson, write_geojson};

use crate::core_error;

/// Count points per polygon and category and add the counts to the
/// polygon layer
///
/// Points are joined to every polygon they fall in (boundaries included),
/// counted per ``key_field`` and ``pivot_field`` value and pivoted into one
/// field per pivot value. Combinations without points count 0. The
/// polygon file is rewritten in place.
///
/// Parameters
/// ----------
/// polygons_path : str
///     GeoJSON polygon layer, updated in place
/// key_field : str
///     Polygon field identifying each polygon; should be unique
/// points_path : str
///     GeoJSON point layer
/// pivot_field : str
///     Point field whose values become count fields
/// validate_keys : bool, default=False
///     Fail instead of fanning out counts when ``key_field`` repeats
/// table_path : str, optional
///     Also write the pivot table to this CSV file
///
/// Returns
/// -------
/// list[str]
///     Names of the fields added to the polygon layer
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (
    polygons_path,
    key_field,
    points_path,
    pivot_field,
    validate_keys = false,
    table_path = None
))]
pub fn pivot_join(
    py: Python<'_>,
    polygons_path: &str,
    key_field: &str,
    points_path: &str,
    pivot_field: &str,
    validate_keys: bool,
    table_path: Option<&str>,
) -> PyResult<Vec<String>> {
    py.detach(|| {
        let polygons_path = Path::new(polygons_path);
        let mut polygons = read_geojson(polygons_path)
            .map_err(|e| core_error("Failed to read polygons", &e))?;
        let points = read_geojson(Path::new(points_path))
            .map_err(|e| core_error("Failed to read points", &e))?;

        let options = PivotOptions {
            validate_keys,
            ..PivotOptions::default()
        };

        if let Some(table_path) = table_path {
            let table =
                build_pivot_table(&polygons, key_field, &points, pivot_field, options.sanitizer)
                    .map_err(|e| core_error("Failed to build pivot table", &e))?;
            let file = File::create(table_path).map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to create {table_path}: {e}"
                ))
            })?;
            table
                .write_csv(file)
                .map_err(|e| core_error("Failed to write pivot table", &e))?;
        }

        let before = polygons.fields().to_vec();
        aggregate_points_in_place(&mut polygons, key_field, &points, pivot_field, options)
            .map_err(|e| core_error("Failed to join point counts", &e))?;

        write_geojson(polygons_path, &polygons)
            .map_err(|e| core_error("Failed to write polygons", &e))?;

        Ok(polygons
            .fields()
            .iter()
            .filter(|field| !before.contains(*field))
            .cloned()
            .collect())
    })
}
