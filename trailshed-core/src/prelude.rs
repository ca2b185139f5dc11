pub use crate::DEFAULT_MAX_IDENTIFIER_LEN;
pub use crate::{Error, SolveFailure};

// Data model
pub use crate::model::{
    AttributeValue, Attributes, Cutoffs, FacilitySet, Feature, FeatureCollection, JunctionPoint,
    TrailSegment, TravelMode, TravelModeRegistry, TravelModes,
};

// Coverage pipeline
pub use crate::algo::coverage::{CoverageLayer, aggregate_coverage};
pub use crate::algo::extract::{Extraction, SourcePointExtractor, load_facility_sets};
pub use crate::algo::pipeline::{AnalysisReport, run_service_area_analysis, solve_facility_sets};
pub use crate::algo::service_area::{ServiceAreaResult, ServiceAreaRunner, SolveOptions};

// Pivot join
pub use crate::algo::pivot::{PivotOptions, PivotTable, aggregate_points, aggregate_points_in_place};

pub use crate::loading::{NetworkConfig, ServiceAreaConfig, create_street_network, parse_travel_modes};
pub use crate::naming::{CollisionPolicy, NameSanitizer, sanitize_name};
pub use crate::network::{NetworkSolver, OverlapPolicy, SolverSettings, StreetNetwork};
pub use crate::store::{FeatureStore, GeoJsonStore, MemoryStore};
