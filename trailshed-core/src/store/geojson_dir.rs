use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Geometry, JsonObject, Value as GeoJsonValue};
use log::debug;

use super::FeatureStore;
use crate::{AttributeValue, Attributes, Error, FeatureCollection};

const EXTENSION: &str = "geojson";
/// Foreign member recording the field schema, so field order and the
/// fields of empty collections survive a round trip
const FIELDS_MEMBER: &str = "fields";

/// Store backed by a directory of `.geojson` files. Namespaces are
/// sub-directories of the root.
#[derive(Debug, Clone)]
pub struct GeoJsonStore {
    root: PathBuf,
}

impl GeoJsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, namespace: &str, name: &str) -> PathBuf {
        self.root
            .join(namespace)
            .join(format!("{name}.{EXTENSION}"))
    }
}

impl FeatureStore for GeoJsonStore {
    fn read(&self, namespace: &str, name: &str) -> Result<FeatureCollection, Error> {
        let path = self.path_of(namespace, name);
        if !path.exists() {
            return Err(Error::CollectionNotFound(path.display().to_string()));
        }
        read_geojson(&path)
    }

    fn write(
        &self,
        namespace: &str,
        name: &str,
        collection: &FeatureCollection,
    ) -> Result<(), Error> {
        write_geojson(&self.path_of(namespace, name), collection)
    }

    fn list(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let dir = self.root.join(namespace);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    fn exists(&self, namespace: &str, name: &str) -> bool {
        self.path_of(namespace, name).is_file()
    }
}

/// Reads a GeoJSON file. A bare feature or geometry becomes a collection
/// of one.
pub fn read_geojson(path: &Path) -> Result<FeatureCollection, Error> {
    let text = fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJsonError(format!("{}: {e}", path.display())))?;
    collection_from_geojson(geojson)
}

/// Writes `collection` to `path`, creating parent directories and
/// replacing an existing file.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(&collection_to_geojson(collection))?;
    fs::write(path, json)?;
    debug!(
        "Wrote {} features to {}",
        collection.len(),
        path.display()
    );
    Ok(())
}

pub fn collection_to_geojson(collection: &FeatureCollection) -> geojson::FeatureCollection {
    let features = collection
        .iter()
        .map(|feature| {
            let properties: JsonObject = feature
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
                .collect();
            let mut out =
                geojson::Feature::from(Geometry::new(GeoJsonValue::from(&feature.geometry)));
            out.properties = Some(properties);
            out
        })
        .collect::<Vec<_>>();

    let mut members = JsonObject::new();
    members.insert(
        FIELDS_MEMBER.to_string(),
        serde_json::Value::from(collection.fields().to_vec()),
    );

    let mut output = geojson::FeatureCollection::from_iter(features);
    output.foreign_members = Some(members);
    output
}

pub fn collection_from_geojson(geojson: GeoJson) -> Result<FeatureCollection, Error> {
    let (features, members) = match geojson {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(feature) => (vec![feature], None),
        GeoJson::Geometry(geometry) => (vec![geojson::Feature::from(geometry)], None),
    };

    let fields = members
        .as_ref()
        .and_then(|m| m.get(FIELDS_MEMBER))
        .and_then(serde_json::Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut collection = FeatureCollection::with_fields(fields);
    for feature in features {
        let geometry = match feature.geometry {
            Some(geometry) => geo::Geometry::<f64>::try_from(geometry)
                .map_err(|e| Error::GeoJsonError(e.to_string()))?,
            None => geo::Geometry::GeometryCollection(geo::GeometryCollection::default()),
        };
        let attributes: Attributes = feature
            .properties
            .unwrap_or_default()
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::from(value)))
            .collect();
        collection.push(geometry, attributes);
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, point};

    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trailshed-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn round_trip_keeps_schema_and_values() {
        let root = temp_root("roundtrip");
        let store = GeoJsonStore::new(&root);

        let mut collection = FeatureCollection::with_fields(["name", "count", "empty"]);
        let mut attributes = Attributes::new();
        attributes.insert("name".into(), "Ridge".into());
        attributes.insert("count".into(), AttributeValue::Integer(3));
        collection.push(Geometry::Point(point!(x: 1.0, y: 2.0)), attributes);

        store.write("points", "ridge_source", &collection).unwrap();
        assert!(store.exists("points", "ridge_source"));
        assert_eq!(store.list("points").unwrap(), vec!["ridge_source"]);

        let back = store.read("points", "ridge_source").unwrap();
        assert_eq!(back.fields(), &["name", "count", "empty"]);
        assert_eq!(back.len(), 1);
        let feature = back.get(0).unwrap();
        assert_eq!(feature.get("count"), &AttributeValue::Integer(3));
        assert!(feature.get("empty").is_null());
        assert_eq!(feature.geometry, Geometry::Point(point!(x: 1.0, y: 2.0)));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_collection_and_namespace() {
        let store = GeoJsonStore::new(temp_root("missing"));
        assert!(store.list("nowhere").unwrap().is_empty());
        assert!(matches!(
            store.read("", "ghost"),
            Err(Error::CollectionNotFound(_))
        ));
    }
}
