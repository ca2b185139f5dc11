use thiserror::Error;

/// Fatal errors. Anything returned as `Error` aborts the run it came from.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown travel mode: {0}")]
    UnknownTravelMode(String),
    #[error("Field '{field}' not found in {collection}")]
    MissingField { field: String, collection: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Name collision: '{raw}' sanitizes to '{name}', which is already taken")]
    NameCollision { raw: String, name: String },
    #[error("Duplicate value {value} in key field '{field}'")]
    DuplicateKey { field: String, value: String },
    #[error("Feature collection not found: {0}")]
    CollectionNotFound(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl Error {
    /// Configuration errors are caused by the caller's parameters rather
    /// than by the data being processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownTravelMode(_)
                | Error::MissingField { .. }
                | Error::InvalidConfig(_)
                | Error::NameCollision { .. }
        )
    }
}

/// Non-fatal outcome of a single service area solve.
///
/// A failure is scoped to one (facility set, travel mode) pair and never
/// aborts the surrounding run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveFailure {
    #[error("facility set is empty")]
    NoFacilities,
    #[error("none of the {0} facilities could be located on the network")]
    NoFacilitiesLocated(usize),
    #[error("no network area is reachable from the facilities within the cutoffs")]
    NothingReachable,
    #[error("solve exceeded the {0:?} timeout")]
    TimedOut(std::time::Duration),
}
