use crate::error::{EngineError, Result};
use anyhow::Context;
use regio_scenario::{variables, InventoryVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration of a cement regionalization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Inventory release; selects the cement activity lists
    pub version: InventoryVersion,

    /// Inventory location used as source when a region has no own activity
    pub rest_of_world: String,

    /// Region whose pollutant values stand in for regions missing from the table
    pub pollutant_fallback_region: String,

    /// Product substring identifying the constituents of a composite market
    pub composite_material: String,

    /// Technosphere inputs of clinker proxies whose name contains one of
    /// these are dropped before the scenario fuel inputs are added
    pub removed_exchange_keywords: Vec<String>,

    /// Kiln fuels, in the order of the scenario fuel mix
    pub fuels: Vec<FuelSupply>,

    /// Biosphere flow name -> scenario pollutant variable
    pub emission_species: BTreeMap<String, String>,

    pub capture: CaptureConfig,

    pub rebalance: RebalanceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: InventoryVersion::V36,
            rest_of_world: "RoW".to_string(),
            pollutant_fallback_region: "CHA".to_string(),
            composite_material: "cement".to_string(),
            removed_exchange_keywords: [
                "diesel",
                "coal",
                "lignite",
                "coke",
                "fuel",
                "meat",
                "gas",
                "oil",
                "electricity",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            fuels: FuelSupply::defaults(),
            emission_species: [
                ("Sulfur dioxide", "SO2"),
                ("Nitrogen oxides", "NOx"),
                ("Carbon monoxide, fossil", "CO"),
                ("Ammonia", "NH3"),
                (
                    "NMVOC, non-methane volatile organic compounds, unspecified origin",
                    "VOC",
                ),
                ("Particulates, < 2.5 um", "PM25"),
            ]
            .into_iter()
            .map(|(flow, label)| (flow.to_string(), label.to_string()))
            .collect(),
            capture: CaptureConfig::default(),
            rebalance: RebalanceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Default configuration for an inventory release
    pub fn for_version(version: InventoryVersion) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("Engine config is not valid TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rest_of_world.trim().is_empty() {
            return Err(EngineError::invalid_config("rest_of_world must not be empty"));
        }
        if self.composite_material.trim().is_empty() {
            return Err(EngineError::invalid_config(
                "composite_material must not be empty",
            ));
        }
        if self.fuels.is_empty() {
            return Err(EngineError::invalid_config("at least one fuel is required"));
        }
        for fuel in &self.fuels {
            if fuel.suppliers.is_empty() {
                return Err(EngineError::invalid_config(format!(
                    "fuel '{}' has no candidate suppliers",
                    fuel.fuel
                )));
            }
        }
        self.capture.validate()?;
        self.rebalance.validate()
    }
}

/// A kiln fuel and where to buy it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelSupply {
    /// Key into the fuel reference table
    pub fuel: String,

    /// Scenario variable holding this fuel's share of kiln energy
    pub share_variable: String,

    /// Product the suppliers must deliver
    pub reference_product: String,

    /// Region searched when the proxy's own region has no supplier
    pub fallback_region: String,

    /// Candidate supplier activity names
    pub suppliers: Vec<String>,
}

impl FuelSupply {
    fn new(
        fuel: &str,
        share_variable: &str,
        reference_product: &str,
        fallback_region: &str,
        suppliers: &[&str],
    ) -> Self {
        Self {
            fuel: fuel.to_string(),
            share_variable: share_variable.to_string(),
            reference_product: reference_product.to_string(),
            fallback_region: fallback_region.to_string(),
            suppliers: suppliers.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Waste, biomass and fossil fuel, as reported by the scenario
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "waste",
                variables::SHARE_WASTE_FUEL,
                "waste plastic, mixture",
                "EUR",
                &["market for waste plastic, mixture"],
            ),
            Self::new(
                "wood pellet",
                variables::SHARE_BIOMASS_FUEL,
                "wood pellet, measured as dry mass",
                "EUR",
                &[
                    "market for wood pellet, measured as dry mass",
                    "wood pellet production",
                ],
            ),
            Self::new(
                "hard coal",
                variables::SHARE_FOSSIL_FUEL,
                "hard coal",
                "REF",
                &[
                    "market for hard coal",
                    "hard coal mine operation and hard coal preparation",
                ],
            ),
        ]
    }
}

/// Fixed supplier of a technosphere input added by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRef {
    pub name: String,
    pub product: String,
    pub unit: String,

    /// Supplier location; `None` means the proxy's own region
    pub location: Option<String>,
}

/// Carbon capture parameters, per kg of CO2 captured unless noted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Process CO2 from calcination, kg per tonne of clinker
    pub calcination_co2_kg_per_t: f64,

    pub electricity_capture_kwh_per_kg: f64,
    pub electricity_compression_kwh_per_kg: f64,

    /// Steam for solvent regeneration
    pub heat_mj_per_kg: f64,

    pub electricity: SupplierRef,
    pub heat: SupplierRef,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            calcination_co2_kg_per_t: 525.0,
            electricity_capture_kwh_per_kg: 0.024,
            electricity_compression_kwh_per_kg: 0.146,
            heat_mj_per_kg: 3.48,
            electricity: SupplierRef {
                name: "market group for electricity, medium voltage".to_string(),
                product: "electricity, medium voltage".to_string(),
                unit: "kilowatt hour".to_string(),
                location: None,
            },
            heat: SupplierRef {
                name: "steam production, as energy carrier, in chemical industry".to_string(),
                product: "heat, from steam, in chemical industry".to_string(),
                unit: "megajoule".to_string(),
                location: Some("RoW".to_string()),
            },
        }
    }
}

impl CaptureConfig {
    /// kWh per kg CO2, capture plus compression
    pub fn electricity_kwh_per_kg(&self) -> f64 {
        self.electricity_capture_kwh_per_kg + self.electricity_compression_kwh_per_kg
    }

    fn validate(&self) -> Result<()> {
        let values = [
            ("calcination_co2_kg_per_t", self.calcination_co2_kg_per_t),
            (
                "electricity_capture_kwh_per_kg",
                self.electricity_capture_kwh_per_kg,
            ),
            (
                "electricity_compression_kwh_per_kg",
                self.electricity_compression_kwh_per_kg,
            ),
            ("heat_mj_per_kg", self.heat_mj_per_kg),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid_config(format!(
                    "capture.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Step sizes of the clinker ratio adjustment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Shares below this are treated as exhausted
    pub floor: f64,

    /// Share moved per iteration
    pub step: f64,

    pub max_iterations: usize,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            floor: 0.001,
            step: 0.01,
            max_iterations: 10_000,
        }
    }
}

impl RebalanceConfig {
    fn validate(&self) -> Result<()> {
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(EngineError::invalid_config(format!(
                "rebalance.step must be in (0, 1], got {}",
                self.step
            )));
        }
        if !(0.0..1.0).contains(&self.floor) {
            return Err(EngineError::invalid_config(format!(
                "rebalance.floor must be in [0, 1), got {}",
                self.floor
            )));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::invalid_config(
                "rebalance.max_iterations must be > 0",
            ));
        }
        Ok(())
    }
}
