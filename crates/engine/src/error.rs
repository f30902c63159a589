use regio_inventory::InventoryError;
use regio_scenario::ScenarioError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("No '{fuel}' suppliers in {region}, nor in fallback region {fallback}")]
    NoSuppliers {
        fuel: String,
        region: String,
        fallback: String,
    },

    #[error(
        "Clinker ratio of {region} stuck at {ratio:.4} after {iterations} steps (target {target:.4})"
    )]
    RebalanceExhausted {
        region: String,
        iterations: usize,
        ratio: f64,
        target: f64,
    },

    #[error("No native clinker ratio for '{name}' at {location}")]
    MissingClinkerRatio { name: String, location: String },

    #[error("All {what} shares of {region} are zero")]
    DegenerateShares { region: String, what: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dataset log error: {0}")]
    Log(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn degenerate(region: impl Into<String>, what: impl Into<String>) -> Self {
        Self::DegenerateShares {
            region: region.into(),
            what: what.into(),
        }
    }
}
