//! Spatial indexing, overlay measures and spatial joins

pub mod index;
pub mod join;
pub mod overlay;

pub use index::{SegmentIndex, SegmentNode, envelope_index};
pub use join::{JoinMatch, largest_overlap_join, one_to_many_join, unique_field_name};
pub use overlay::{overlap_measure, union_all};
