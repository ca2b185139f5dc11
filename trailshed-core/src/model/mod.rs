//! Data model shared by the extraction, solving and aggregation stages

pub mod attributes;
pub mod facility;
pub mod features;
pub mod trail;
pub mod travel_mode;

pub use attributes::{AttributeValue, Attributes};
pub use facility::{FACILITY_SUFFIX, FacilitySet};
pub use features::{Feature, FeatureCollection};
pub use trail::{JunctionPoint, TrailSegment};
pub use travel_mode::{Cutoffs, TravelMode, TravelModeRegistry, TravelModes};
