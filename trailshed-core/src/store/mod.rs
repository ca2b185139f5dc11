//! Durable named feature collections.
//!
//! A store is a folder-like namespace tree holding named collections.
//! Writes overwrite, so persisting under the same name twice is idempotent
//! by name rather than accumulative.

mod geojson_dir;
mod memory;

pub use geojson_dir::{
    GeoJsonStore, collection_from_geojson, collection_to_geojson, read_geojson, write_geojson,
};
pub use memory::MemoryStore;

use crate::{Error, FeatureCollection};

pub trait FeatureStore: Sync {
    /// # Errors
    ///
    /// `CollectionNotFound` when nothing is stored under the name.
    fn read(&self, namespace: &str, name: &str) -> Result<FeatureCollection, Error>;

    /// Stores `collection`, replacing any previous collection of that name.
    fn write(&self, namespace: &str, name: &str, collection: &FeatureCollection)
    -> Result<(), Error>;

    /// Names stored directly in `namespace`, sorted. An unknown namespace
    /// is empty.
    fn list(&self, namespace: &str) -> Result<Vec<String>, Error>;

    fn exists(&self, namespace: &str, name: &str) -> bool;
}

pub(crate) fn qualified(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}
