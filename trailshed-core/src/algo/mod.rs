pub mod coverage;
pub mod extract;
pub mod pipeline;
pub mod pivot;
pub mod service_area;

pub use coverage::{BOOKKEEPING_FIELDS, CoverageLayer, aggregate_coverage, merge_successful};
pub use extract::{Extraction, SourcePointExtractor, load_facility_sets};
pub use pipeline::{
    AnalysisReport, SolveReport, coverage_name, results_namespace, run_service_area_analysis,
    solve_facility_sets,
};
pub use pivot::{
    GroupCount, NULL_PIVOT_COLUMN, PivotOptions, PivotRow, PivotTable, aggregate_points,
    aggregate_points_in_place, build_pivot_table, group_counts, rejoin,
};
pub use service_area::{ServiceAreaResult, ServiceAreaRunner, SolveOptions};
