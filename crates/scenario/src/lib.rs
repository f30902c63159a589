//! # Regio Scenario
//!
//! Read-only inputs of a regionalization run.
//!
//! - **Region crosswalk** - inventory locations <-> scenario regions,
//!   with a rest-of-world region for everything unmapped
//! - **Scenario table** - region x variable x year coefficients, frozen
//!   to a single year before a run
//! - **Reference tables** - fuel heating values and CO2 factors,
//!   clinker-to-cement ratios

mod coefficients;
mod crosswalk;
mod error;
mod reference;
mod series;

pub use coefficients::{variables, RegionVariable, ScenarioCoefficients, ScenarioTable};
pub use crosswalk::{CrosswalkBuilder, RegionCrosswalk};
pub use error::{Result, ScenarioError};
pub use reference::{ClinkerRatios, FuelProperties, FuelTable, InventoryVersion, NameLocation};
pub use series::TimeSeries;
