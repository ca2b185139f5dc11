//! Travel modes, the registry they are looked up in, and impedance cutoffs

use serde::{Deserialize, Serialize};

use crate::Error;

/// Impedance configuration of one way of moving over the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelMode {
    pub name: String,
    /// Travel speed in kilometers per hour
    pub speed_kmh: f64,
    /// Edge classes this mode may not traverse
    #[serde(default)]
    pub restricted_classes: Vec<String>,
}

impl TravelMode {
    pub fn new(name: impl Into<String>, speed_kmh: f64) -> Self {
        Self {
            name: name.into(),
            speed_kmh,
            restricted_classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_restricted(mut self, class: impl Into<String>) -> Self {
        self.restricted_classes.push(class.into());
        self
    }

    /// Minutes needed to cover `length_m` meters
    pub fn minutes_for(&self, length_m: f64) -> f64 {
        length_m / (self.speed_kmh * 1000.0 / 60.0)
    }

    pub fn allows(&self, class: Option<&str>) -> bool {
        class.is_none_or(|class| !self.restricted_classes.iter().any(|r| r == class))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.speed_kmh.is_finite() && self.speed_kmh > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!(
                "travel mode '{}' has non-positive speed {}",
                self.name, self.speed_kmh
            )))
        }
    }
}

/// String-keyed lookup of travel modes exposed by a network
pub trait TravelModeRegistry {
    /// # Errors
    ///
    /// `UnknownTravelMode` if no mode has this name.
    fn lookup(&self, name: &str) -> Result<&TravelMode, Error>;

    fn names(&self) -> Vec<&str>;
}

/// Travel modes of a network, in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TravelModes {
    modes: Vec<TravelMode>,
}

impl TravelModes {
    /// # Errors
    ///
    /// `InvalidConfig` on duplicate names or non-positive speeds.
    pub fn new(modes: Vec<TravelMode>) -> Result<Self, Error> {
        for (idx, mode) in modes.iter().enumerate() {
            mode.validate()?;
            if modes[..idx].iter().any(|m| m.name == mode.name) {
                return Err(Error::InvalidConfig(format!(
                    "travel mode '{}' is declared twice",
                    mode.name
                )));
            }
        }
        Ok(Self { modes })
    }

    /// Parses a JSON array of travel modes.
    ///
    /// # Errors
    ///
    /// `JsonError` on malformed input, otherwise as [`TravelModes::new`].
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let modes: Vec<TravelMode> = serde_json::from_str(json)?;
        Self::new(modes)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl TravelModeRegistry for TravelModes {
    fn lookup(&self, name: &str) -> Result<&TravelMode, Error> {
        self.modes
            .iter()
            .find(|mode| mode.name == name)
            .ok_or_else(|| Error::UnknownTravelMode(name.to_string()))
    }

    fn names(&self) -> Vec<&str> {
        self.modes.iter().map(|mode| mode.name.as_str()).collect()
    }
}

/// Ascending, de-duplicated impedance thresholds in minutes
#[derive(Debug, Clone, PartialEq)]
pub struct Cutoffs(Vec<f64>);

impl Cutoffs {
    /// # Errors
    ///
    /// `InvalidConfig` if the list is empty or holds a value that is not a
    /// positive finite number.
    pub fn new(mut values: Vec<f64>) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::InvalidConfig("at least one cutoff is required".into()));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cutoff {bad} is not a positive number"
            )));
        }
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn max(&self) -> f64 {
        self.0.last().copied().unwrap_or_default()
    }
}
