use std::fs;

use geo::Geometry;
use log::{info, warn};

use super::config::NetworkConfig;
use crate::network::{SolverSettings, StreetNetwork, StreetNetworkBuilder};
use crate::store::read_geojson;
use crate::{Error, FeatureCollection, TravelModeRegistry, TravelModes};

/// Creates a street network based on the provided configuration
///
/// # Errors
///
/// Returns an error if there are problems reading or processing data
pub fn create_street_network(config: &NetworkConfig) -> Result<StreetNetwork, Error> {
    validate_config(config)?;

    info!(
        "Processing street lines: {}",
        config.lines_path.display()
    );
    let lines = read_geojson(&config.lines_path)?;

    let modes_json = fs::read_to_string(&config.travel_modes_path)?;
    let modes = TravelModes::from_json_str(&modes_json)?;
    info!("Loaded travel modes: {}", modes.names().join(", "));

    let network = network_from_lines(
        &lines,
        config.class_field.as_deref(),
        config.merge_tolerance,
        modes,
        config.settings,
    )?;

    info!(
        "Street network created with {} nodes and {} edges",
        network.node_count(),
        network.edge_count()
    );
    Ok(network)
}

/// Builds a street network from line features. Every line (or line part)
/// becomes an edge between the nodes at its endpoints.
///
/// # Errors
///
/// `MissingField` when `class_field` is not in the schema.
pub fn network_from_lines(
    lines: &FeatureCollection,
    class_field: Option<&str>,
    merge_tolerance: f64,
    modes: TravelModes,
    settings: SolverSettings,
) -> Result<StreetNetwork, Error> {
    if let Some(field) = class_field {
        lines.require_field(field, "street lines")?;
    }

    let mut builder = StreetNetworkBuilder::new().with_merge_tolerance(merge_tolerance);
    let mut skipped = 0usize;

    for feature in lines {
        let class = class_field
            .map(|field| feature.get(field))
            .filter(|value| !value.is_null())
            .map(ToString::to_string);

        let parts = match &feature.geometry {
            Geometry::LineString(ls) => vec![ls.clone()],
            Geometry::MultiLineString(mls) => mls.0.clone(),
            Geometry::Line(line) => vec![(*line).into()],
            _ => {
                skipped += 1;
                continue;
            }
        };

        for part in parts {
            if !builder.add_line(part, class.clone()) {
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{skipped} street features or parts were not usable as edges and were skipped");
    }

    Ok(builder.build(modes, settings))
}

fn validate_config(config: &NetworkConfig) -> Result<(), Error> {
    if !config.lines_path.exists() {
        return Err(Error::InvalidConfig(format!(
            "Street lines file not found: {}",
            config.lines_path.display()
        )));
    }

    if !config.travel_modes_path.exists() {
        return Err(Error::InvalidConfig(format!(
            "Travel modes file not found: {}",
            config.travel_modes_path.display()
        )));
    }

    if !config.merge_tolerance.is_finite() || config.merge_tolerance < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "Merge tolerance {} is not a non-negative number",
            config.merge_tolerance
        )));
    }

    Ok(())
}
