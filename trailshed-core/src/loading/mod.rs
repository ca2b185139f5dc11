//! Run configuration and construction of the street network from line data

mod builder;
mod config;

pub use builder::{create_street_network, network_from_lines};
pub use config::{NetworkConfig, ServiceAreaConfig, parse_travel_modes};
