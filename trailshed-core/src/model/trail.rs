//! Trail segments and junction points read from feature collections

use geo::{Geometry, MultiLineString, Point};

use super::attributes::{AttributeValue, Attributes};
use super::features::FeatureCollection;
use crate::Error;

/// A trail line with the value of its naming field
#[derive(Debug, Clone)]
pub struct TrailSegment {
    pub fid: usize,
    pub geometry: MultiLineString<f64>,
    pub name: AttributeValue,
}

impl TrailSegment {
    /// Reads every feature of `lines` as a trail segment.
    ///
    /// # Errors
    ///
    /// `MissingField` if `naming_field` is not in the schema, `InvalidData`
    /// for features whose geometry is not linear.
    pub fn from_collection(
        lines: &FeatureCollection,
        naming_field: &str,
    ) -> Result<Vec<TrailSegment>, Error> {
        lines.require_field(naming_field, "trail lines")?;

        lines
            .iter()
            .map(|feature| {
                let geometry = match &feature.geometry {
                    Geometry::LineString(ls) => MultiLineString::new(vec![ls.clone()]),
                    Geometry::MultiLineString(mls) => mls.clone(),
                    Geometry::Line(line) => MultiLineString::new(vec![(*line).into()]),
                    other => {
                        return Err(Error::InvalidData(format!(
                            "trail feature {} is not a line: {other:?}",
                            feature.fid
                        )));
                    }
                };
                Ok(TrailSegment {
                    fid: feature.fid,
                    geometry,
                    name: feature.get(naming_field).clone(),
                })
            })
            .collect()
    }
}

/// A network junction that can serve as a facility
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionPoint {
    pub fid: usize,
    pub geometry: Point<f64>,
    pub attributes: Attributes,
}

impl JunctionPoint {
    /// Reads every feature of `points` as a junction.
    ///
    /// # Errors
    ///
    /// `InvalidData` for features whose geometry is not a point.
    pub fn from_collection(points: &FeatureCollection) -> Result<Vec<JunctionPoint>, Error> {
        points
            .iter()
            .map(|feature| match &feature.geometry {
                Geometry::Point(point) => Ok(JunctionPoint {
                    fid: feature.fid,
                    geometry: *point,
                    attributes: feature.attributes.clone(),
                }),
                other => Err(Error::InvalidData(format!(
                    "junction feature {} is not a point: {other:?}",
                    feature.fid
                ))),
            })
            .collect()
    }
}
