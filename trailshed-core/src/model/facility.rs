//! Facility sets: the junctions selected for one trail segment

use geo::{Geometry, MultiPoint, Point};

use super::features::FeatureCollection;
use super::trail::JunctionPoint;
use crate::Error;

/// Suffix of the feature collection a facility set is persisted under
pub const FACILITY_SUFFIX: &str = "_source";

/// Named set of facility points, one per trail segment
#[derive(Debug, Clone, PartialEq)]
pub struct FacilitySet {
    /// Sanitized, run-unique identifier
    pub name: String,
    /// Naming field value the identifier was derived from
    pub source_name: String,
    /// Fid of the trail segment the set was built for, if known
    pub trail_fid: Option<usize>,
    pub points: Vec<JunctionPoint>,
}

impl FacilitySet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn locations(&self) -> Vec<Point<f64>> {
        self.points.iter().map(|p| p.geometry).collect()
    }

    pub fn multi_point(&self) -> MultiPoint<f64> {
        self.locations().into()
    }

    /// Name of the persisted collection, `<name>_source`
    pub fn collection_name(&self) -> String {
        format!("{}{FACILITY_SUFFIX}", self.name)
    }

    /// Junction features with their original attributes. The schema is
    /// kept even when the set is empty.
    pub fn to_feature_collection(&self, junction_fields: &[String]) -> FeatureCollection {
        let mut collection = FeatureCollection::with_fields(junction_fields.iter().cloned());
        for point in &self.points {
            collection.push(Geometry::Point(point.geometry), point.attributes.clone());
        }
        collection
    }

    /// Rebuilds a facility set from a persisted `<name>_source` collection.
    ///
    /// # Errors
    ///
    /// `InvalidData` when the collection holds non-point features.
    pub fn from_feature_collection(
        collection_name: &str,
        collection: &FeatureCollection,
    ) -> Result<Self, Error> {
        let name = collection_name
            .strip_suffix(FACILITY_SUFFIX)
            .unwrap_or(collection_name)
            .to_string();

        Ok(Self {
            source_name: name.clone(),
            name,
            trail_fid: None,
            points: JunctionPoint::from_collection(collection)?,
        })
    }
}
