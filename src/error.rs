use std::fmt::{self, Debug, Display};
use std::io;

/// Every failure the simulator reports to its caller.
///
/// Configuration errors are detected while building the network, the parameter table, the
/// intervention, or a replicate's initial population. Nothing in the stepping loop returns an
/// error.
#[derive(Debug)]
pub enum SimError {
    Configuration(String),
    Io(io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, SimError::Configuration(_))
    }
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::Io(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::Json(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        SimError::Csv(error)
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Configuration(_) => None,
            SimError::Io(error) => Some(error),
            SimError::Json(error) => Some(error),
            SimError::Csv(error) => Some(error),
        }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Configuration(message) => write!(f, "configuration error: {message}"),
            SimError::Io(error) => write!(f, "i/o error: {error}"),
            SimError::Json(error) => write!(f, "json error: {error}"),
            SimError::Csv(error) => write!(f, "csv error: {error}"),
        }
    }
}
