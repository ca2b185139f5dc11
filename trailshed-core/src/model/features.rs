//! Feature collections: geometry plus an attribute table with a fixed schema

use geo::Geometry;

use super::attributes::{AttributeValue, Attributes};
use crate::Error;

/// One row of a feature collection
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature id, the position of the feature in its collection
    pub fid: usize,
    pub geometry: Geometry<f64>,
    pub attributes: Attributes,
}

impl Feature {
    pub fn get(&self, field: &str) -> &AttributeValue {
        const NULL: &AttributeValue = &AttributeValue::Null;
        self.attributes.get(field).unwrap_or(NULL)
    }
}

/// Ordered set of features sharing one field schema.
///
/// Every feature carries a value (possibly null) for every field in
/// [`FeatureCollection::fields`], in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    fields: Vec<String>,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collection = Self::new();
        for field in fields {
            collection.add_field(field);
        }
        collection
    }

    /// Appends a feature and returns its fid. Fields unknown to the schema
    /// are added to it.
    pub fn push(&mut self, geometry: Geometry<f64>, attributes: Attributes) -> usize {
        for field in attributes.keys() {
            if !self.has_field(field) {
                self.add_field(field.clone());
            }
        }

        let mut row = Attributes::with_capacity(self.fields.len());
        for field in &self.fields {
            row.insert(
                field.clone(),
                attributes.get(field).cloned().unwrap_or_default(),
            );
        }

        let fid = self.features.len();
        self.features.push(Feature {
            fid,
            geometry,
            attributes: row,
        });
        fid
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Fails with a configuration error when `field` is missing.
    pub fn require_field(&self, field: &str, collection: &str) -> Result<(), Error> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(Error::MissingField {
                field: field.to_string(),
                collection: collection.to_string(),
            })
        }
    }

    /// Adds a field filled with nulls. Existing fields are left untouched.
    pub fn add_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if self.has_field(&field) {
            return;
        }
        for feature in &mut self.features {
            feature
                .attributes
                .insert(field.clone(), AttributeValue::Null);
        }
        self.fields.push(field);
    }

    /// Removes the named fields; names not in the schema are ignored.
    pub fn delete_fields(&mut self, fields: &[&str]) {
        self.fields.retain(|f| !fields.contains(&f.as_str()));
        for feature in &mut self.features {
            feature
                .attributes
                .retain(|name, _| !fields.contains(&name.as_str()));
        }
    }

    pub fn set_value(&mut self, fid: usize, field: &str, value: AttributeValue) {
        if !self.has_field(field) {
            self.add_field(field);
        }
        if let Some(feature) = self.features.get_mut(fid) {
            feature.attributes.insert(field.to_string(), value);
        }
    }

    pub fn get(&self, fid: usize) -> Option<&Feature> {
        self.features.get(fid)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Concatenates collections into one. Features stay distinct, fids are
    /// renumbered in input order and the schema is the union of all
    /// schemas.
    pub fn merge<'a, I>(collections: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureCollection>,
    {
        let mut merged = Self::new();
        for collection in collections {
            for field in &collection.fields {
                merged.add_field(field.clone());
            }
            for feature in &collection.features {
                merged.push(feature.geometry.clone(), feature.attributes.clone());
            }
        }
        merged
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
