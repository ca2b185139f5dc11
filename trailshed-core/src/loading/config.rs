use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::{OverlapPolicy, SolverSettings};
use crate::naming::{CollisionPolicy, NameSanitizer};
use crate::{Cutoffs, DEFAULT_MAX_IDENTIFIER_LEN, Error};

/// Parameters of one service area coverage run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAreaConfig {
    /// Trail field the facility set names are derived from
    pub naming_field: String,
    /// Junction search distance around each trail, in meters
    pub search_distance: f64,
    /// Travel mode names, solved in this order
    pub travel_modes: Vec<String>,
    /// Impedance cutoffs in minutes
    pub cutoffs: Vec<f64>,
    #[serde(default)]
    pub overlap: OverlapPolicy,
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    /// Solve the facility sets of a travel mode on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Upper bound for a single solve, in seconds
    #[serde(default)]
    pub solve_timeout_secs: Option<f64>,
    #[serde(default = "default_max_identifier_len")]
    pub max_identifier_len: usize,
}

fn default_parallel() -> bool {
    true
}

fn default_max_identifier_len() -> usize {
    DEFAULT_MAX_IDENTIFIER_LEN
}

impl ServiceAreaConfig {
    pub fn new(
        naming_field: impl Into<String>,
        search_distance: f64,
        travel_modes: Vec<String>,
        cutoffs: Vec<f64>,
    ) -> Self {
        Self {
            naming_field: naming_field.into(),
            search_distance,
            travel_modes,
            cutoffs,
            overlap: OverlapPolicy::default(),
            collision_policy: CollisionPolicy::default(),
            parallel: default_parallel(),
            solve_timeout_secs: None,
            max_identifier_len: DEFAULT_MAX_IDENTIFIER_LEN,
        }
    }

    /// # Errors
    ///
    /// `JsonError` on malformed input; the result is not validated.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks every parameter before any work starts.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` describing the first bad parameter.
    pub fn validate(&self) -> Result<(), Error> {
        if self.naming_field.trim().is_empty() {
            return Err(Error::InvalidConfig("naming field is empty".into()));
        }
        if !self.search_distance.is_finite() || self.search_distance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "search distance {} is not a non-negative number",
                self.search_distance
            )));
        }
        if self.travel_modes.is_empty() {
            return Err(Error::InvalidConfig("no travel modes given".into()));
        }
        if let Some(timeout) = self.solve_timeout_secs
            && (!timeout.is_finite() || timeout <= 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "solve timeout {timeout} is not a positive number of seconds"
            )));
        }
        Cutoffs::new(self.cutoffs.clone())?;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`Cutoffs::new`].
    pub fn cutoffs(&self) -> Result<Cutoffs, Error> {
        Cutoffs::new(self.cutoffs.clone())
    }

    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    pub fn sanitizer(&self) -> NameSanitizer {
        NameSanitizer::new(self.max_identifier_len)
    }
}

/// Splits a semicolon separated travel mode list, dropping blank entries.
pub fn parse_travel_modes(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|mode| !mode.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sources of a street network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// GeoJSON file with one line feature per street
    pub lines_path: PathBuf,
    /// JSON array of travel modes
    pub travel_modes_path: PathBuf,
    /// Attribute holding the street class, if any
    #[serde(default)]
    pub class_field: Option<String>,
    /// Endpoints closer than this many meters share a node
    #[serde(default = "default_merge_tolerance")]
    pub merge_tolerance: f64,
    #[serde(default)]
    pub settings: SolverSettings,
}

fn default_merge_tolerance() -> f64 {
    0.5
}

impl NetworkConfig {
    pub fn new(lines_path: impl Into<PathBuf>, travel_modes_path: impl Into<PathBuf>) -> Self {
        Self {
            lines_path: lines_path.into(),
            travel_modes_path: travel_modes_path.into(),
            class_field: None,
            merge_tolerance: default_merge_tolerance(),
            settings: SolverSettings::default(),
        }
    }
}
