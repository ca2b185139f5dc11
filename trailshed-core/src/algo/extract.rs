//! Selection of junction points along each trail segment.
//!
//! Every trail yields exactly one [`FacilitySet`], including trails with no
//! junction nearby, so outputs correspond 1:1 to input segments.

use log::{debug, info, warn};

use crate::naming::{CollisionPolicy, NameCollision, NameRegistry, NameSanitizer};
use crate::spatial::SegmentIndex;
use crate::store::FeatureStore;
use crate::{Error, FacilitySet, FeatureCollection, JunctionPoint, TrailSegment};

/// Facility sets of one extraction run
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// One set per trail segment, in trail order
    pub facility_sets: Vec<FacilitySet>,
    /// Naming collisions detected while naming the sets
    pub collisions: Vec<NameCollision>,
    /// Junction schema, carried into the persisted collections
    pub junction_fields: Vec<String>,
}

impl Extraction {
    pub fn empty_sets(&self) -> impl Iterator<Item = &FacilitySet> {
        self.facility_sets.iter().filter(|set| set.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SourcePointExtractor {
    search_distance: f64,
    sanitizer: NameSanitizer,
    collision_policy: CollisionPolicy,
}

impl SourcePointExtractor {
    pub fn new(search_distance: f64) -> Self {
        Self {
            search_distance,
            sanitizer: NameSanitizer::default(),
            collision_policy: CollisionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: NameSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Builds the facility sets for every trail in `lines`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a negative or non-finite search distance,
    /// `MissingField` if `naming_field` is not a trail field, `InvalidData`
    /// for non-linear trails or non-point junctions, `NameCollision` under
    /// [`CollisionPolicy::Abort`].
    pub fn extract(
        &self,
        lines: &FeatureCollection,
        junctions: &FeatureCollection,
        naming_field: &str,
    ) -> Result<Extraction, Error> {
        self.check_search_distance()?;
        let trails = TrailSegment::from_collection(lines, naming_field)?;
        let points = JunctionPoint::from_collection(junctions)?;
        let mut extraction = self.extract_segments(&trails, &points)?;
        extraction.junction_fields = junctions.fields().to_vec();
        Ok(extraction)
    }

    /// Facility sets for already decoded trails and junctions.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a negative or non-finite search distance,
    /// `NameCollision` under [`CollisionPolicy::Abort`].
    pub fn extract_segments(
        &self,
        trails: &[TrailSegment],
        junctions: &[JunctionPoint],
    ) -> Result<Extraction, Error> {
        self.check_search_distance()?;
        let index = SegmentIndex::new(trails.iter().map(|trail| &trail.geometry));

        let mut selected: Vec<Vec<JunctionPoint>> = vec![Vec::new(); trails.len()];
        for junction in junctions {
            for owner in index.owners_within(junction.geometry, self.search_distance) {
                selected[owner].push(junction.clone());
            }
        }

        let mut registry = NameRegistry::new(self.sanitizer, self.collision_policy);
        let mut extraction = Extraction::default();

        for (trail, points) in trails.iter().zip(selected) {
            let source_name = trail.name.to_string();
            let claimed = registry.claim(&source_name)?;
            if let Some(collision) = claimed.collision {
                extraction.collisions.push(collision);
            }

            debug!(
                "Trail {} '{source_name}': {} junctions within {} m",
                trail.fid,
                points.len(),
                self.search_distance
            );
            extraction.facility_sets.push(FacilitySet {
                name: claimed.name,
                source_name,
                trail_fid: Some(trail.fid),
                points,
            });
        }

        let empty = extraction.empty_sets().count();
        if empty > 0 {
            warn!("{empty} trail segments have no junction within {} m", self.search_distance);
        }
        info!(
            "Extracted {} facility sets from {} junctions",
            extraction.facility_sets.len(),
            junctions.len()
        );
        Ok(extraction)
    }

    fn check_search_distance(&self) -> Result<(), Error> {
        if !self.search_distance.is_finite() || self.search_distance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "search distance {} is not a non-negative number",
                self.search_distance
            )));
        }
        Ok(())
    }

    /// Writes every set to `store` as `<name>_source`, replacing earlier
    /// output of the same name. Returns the written collection names.
    ///
    /// # Errors
    ///
    /// Any store error.
    pub fn persist(
        &self,
        extraction: &Extraction,
        store: &dyn FeatureStore,
        namespace: &str,
    ) -> Result<Vec<String>, Error> {
        let mut written = Vec::with_capacity(extraction.facility_sets.len());
        for set in &extraction.facility_sets {
            let name = set.collection_name();
            store.write(
                namespace,
                &name,
                &set.to_feature_collection(&extraction.junction_fields),
            )?;
            written.push(name);
        }
        info!("Successfully added points to '{namespace}'");
        Ok(written)
    }
}

/// Reloads every persisted facility set (`*_source`) of a namespace
///
/// # Errors
///
/// Any store error, `InvalidData` for collections holding non-points.
pub fn load_facility_sets(
    store: &dyn FeatureStore,
    namespace: &str,
) -> Result<Vec<FacilitySet>, Error> {
    store
        .list(namespace)?
        .into_iter()
        .filter(|name| name.ends_with(crate::FACILITY_SUFFIX))
        .map(|name| {
            let collection = store.read(namespace, &name)?;
            FacilitySet::from_feature_collection(&name, &collection)
        })
        .collect()
}
