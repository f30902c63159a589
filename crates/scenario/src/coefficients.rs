use crate::error::{Result, ScenarioError};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable labels read by the cement engine
pub mod variables {
    /// Prefix of per-kiln production volume shares, e.g. "Production volume share, wet kiln"
    pub const KILN_SHARE_PREFIX: &str = "Production volume share";
    /// Prefix of per-kiln thermal intensities in MJ/t clinker
    pub const THERMAL_ENERGY_PREFIX: &str = "Thermal energy consumption";

    pub const SHARE_WASTE_FUEL: &str = "Share waste fuel";
    pub const SHARE_BIOMASS_FUEL: &str = "Share biomass fuel";
    pub const SHARE_FOSSIL_FUEL: &str = "Share fossil fuel";

    pub const RECOVERED_ENERGY_SHARE: &str = "Share of recovered energy, per ton clinker";

    /// kWh/t cement
    pub const POWER_CONSUMPTION: &str = "Power consumption";
    /// kWh/t cement
    pub const POWER_GENERATION: &str = "Power generation";

    pub const CAPTURED_CO2: &str = "Emi|CCO2|FFaI|Industry|Cement";
    pub const EMITTED_CO2: &str = "Emi|CO2|FFaI|Industry|Cement";
}

/// (region, variable) key of a scenario value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionVariable {
    pub region: String,
    pub variable: String,
}

impl RegionVariable {
    pub fn new(region: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            variable: variable.into(),
        }
    }
}

/// Region x variable x year table as delivered by the scenario model
#[derive(Debug, Clone, Default)]
pub struct ScenarioTable {
    series: BTreeMap<RegionVariable, TimeSeries>,
}

impl ScenarioTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        region: impl Into<String>,
        variable: impl Into<String>,
        year: i32,
        value: f64,
    ) {
        self.series
            .entry(RegionVariable::new(region, variable))
            .or_default()
            .insert(year, value);
    }

    /// Builder-style [`ScenarioTable::insert`]
    pub fn with(
        mut self,
        region: impl Into<String>,
        variable: impl Into<String>,
        year: i32,
        value: f64,
    ) -> Self {
        self.insert(region, variable, year, value);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Freeze every series at `year`
    pub fn at_year(&self, year: i32) -> Result<ScenarioCoefficients> {
        let mut values = BTreeMap::new();
        for (key, series) in &self.series {
            values.insert(key.clone(), series.interpolate(year)?);
        }

        log::debug!(
            "Interpolated {} scenario series to {}",
            values.len(),
            year
        );

        Ok(ScenarioCoefficients { year, values })
    }
}

/// Scenario values of a single year, read-only for the whole run
#[derive(Debug, Clone)]
pub struct ScenarioCoefficients {
    year: i32,
    values: BTreeMap<RegionVariable, f64>,
}

impl ScenarioCoefficients {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn get(&self, region: &str, variable: &str) -> Option<f64> {
        self.values
            .get(&RegionVariable::new(region, variable))
            .copied()
    }

    pub fn require(&self, region: &str, variable: &str) -> Result<f64> {
        self.get(region, variable)
            .ok_or_else(|| ScenarioError::unknown_variable(region, variable))
    }

    /// `(suffix, value)` of every variable of `region` starting with `prefix`.
    ///
    /// The suffix is what follows the prefix, stripped of a leading ", " or "|".
    pub fn with_prefix<'a>(
        &'a self,
        region: &'a str,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.values
            .range(RegionVariable::new(region, prefix)..)
            .take_while(move |(key, _)| {
                key.region == region && key.variable.starts_with(prefix)
            })
            .map(move |(key, &value)| {
                let suffix = key.variable[prefix.len()..]
                    .trim_start_matches([',', '|'])
                    .trim_start();
                (suffix, value)
            })
    }
}
