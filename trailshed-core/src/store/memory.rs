use std::sync::RwLock;

use hashbrown::HashMap;

use super::{FeatureStore, qualified};
use crate::{Error, FeatureCollection};

/// Store keeping collections in memory, keyed by namespace and name
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<(String, String), FeatureCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.collections.read().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::InvalidData("memory store lock poisoned".to_string())
}

impl FeatureStore for MemoryStore {
    fn read(&self, namespace: &str, name: &str) -> Result<FeatureCollection, Error> {
        self.collections
            .read()
            .map_err(poisoned)?
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(qualified(namespace, name)))
    }

    fn write(
        &self,
        namespace: &str,
        name: &str,
        collection: &FeatureCollection,
    ) -> Result<(), Error> {
        self.collections
            .write()
            .map_err(poisoned)?
            .insert((namespace.to_string(), name.to_string()), collection.clone());
        Ok(())
    }

    fn list(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .map_err(poisoned)?
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    fn exists(&self, namespace: &str, name: &str) -> bool {
        self.collections
            .read()
            .is_ok_and(|c| c.contains_key(&(namespace.to_string(), name.to_string())))
    }
}
