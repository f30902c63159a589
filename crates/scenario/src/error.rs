use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("No value for '{variable}' in region {region}")]
    UnknownVariable { region: String, variable: String },

    #[error("Unknown fuel: {0}")]
    UnknownFuel(String),

    #[error("Time series is empty")]
    EmptySeries,

    #[error("Location {location} is assigned to both {first} and {second}")]
    ConflictingLocation {
        location: String,
        first: String,
        second: String,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl ScenarioError {
    pub fn unknown_variable(region: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::UnknownVariable {
            region: region.into(),
            variable: variable.into(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
