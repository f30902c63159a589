use crate::error::{Result, ScenarioError};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const BUILTIN_LHV: &str = include_str!("../data/fuels_lower_heating_value.txt");
const BUILTIN_CO2: &str = include_str!("../data/fuel_co2_emission_factor.txt");

/// Release of the background inventory being regionalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InventoryVersion {
    #[serde(rename = "3.5")]
    V35,
    #[default]
    #[serde(rename = "3.6")]
    V36,
}

/// Combustion properties of a fuel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelProperties {
    /// MJ per kg
    pub lower_heating_value: f64,

    /// kg CO2 per MJ
    pub co2_per_mj: f64,

    /// Share of the CO2 that is biogenic, in [0, 1]
    pub biogenic_share: f64,
}

impl FuelProperties {
    /// kg fossil CO2 per MJ
    pub fn fossil_co2_per_mj(&self) -> f64 {
        self.co2_per_mj * (1.0 - self.biogenic_share)
    }

    /// kg biogenic CO2 per MJ
    pub fn biogenic_co2_per_mj(&self) -> f64 {
        self.co2_per_mj * self.biogenic_share
    }
}

/// Lower heating values and CO2 factors by fuel name
#[derive(Debug, Clone, Default)]
pub struct FuelTable {
    fuels: BTreeMap<String, FuelProperties>,
}

impl FuelTable {
    /// Tables shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_LHV, BUILTIN_CO2)
    }

    /// Parse `fuel;lhv` lines and `fuel;co2;biogenic share` lines.
    ///
    /// Only fuels present in both tables are kept.
    pub fn parse(lhv: &str, co2: &str) -> Result<Self> {
        let mut heating_values = HashMap::new();
        for (line, fields) in records(lhv) {
            let [fuel, value] = fields_exact::<2>(line, &fields)?;
            heating_values.insert(fuel.to_string(), number(line, value)?);
        }

        let mut fuels = BTreeMap::new();
        for (line, fields) in records(co2) {
            let [fuel, factor, bio_share] = fields_exact::<3>(line, &fields)?;
            let Some(&lower_heating_value) = heating_values.get(fuel) else {
                log::warn!("Fuel '{fuel}' has a CO2 factor but no heating value, skipped");
                continue;
            };
            let biogenic_share = number(line, bio_share)?;
            if !(0.0..=1.0).contains(&biogenic_share) {
                return Err(ScenarioError::parse(
                    line,
                    format!("biogenic share {biogenic_share} outside [0, 1]"),
                ));
            }
            fuels.insert(
                fuel.to_string(),
                FuelProperties {
                    lower_heating_value,
                    co2_per_mj: number(line, factor)?,
                    biogenic_share,
                },
            );
        }

        Ok(Self { fuels })
    }

    pub fn insert(&mut self, fuel: impl Into<String>, properties: FuelProperties) {
        self.fuels.insert(fuel.into(), properties);
    }

    pub fn get(&self, fuel: &str) -> Result<&FuelProperties> {
        self.fuels
            .get(fuel)
            .ok_or_else(|| ScenarioError::UnknownFuel(fuel.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fuels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuels.is_empty()
    }
}

/// (activity name, location) key of a native clinker ratio
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameLocation {
    pub name: String,
    pub location: String,
}

impl NameLocation {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Clinker-to-cement mass ratios
#[derive(Debug, Clone, Default)]
pub struct ClinkerRatios {
    /// Inventory ratios per release, by producing activity
    native: HashMap<InventoryVersion, HashMap<NameLocation, f64>>,

    /// Scenario ratios by region
    target: BTreeMap<String, TimeSeries>,
}

impl ClinkerRatios {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_native(
        &mut self,
        version: InventoryVersion,
        name: impl Into<String>,
        location: impl Into<String>,
        ratio: f64,
    ) {
        self.native
            .entry(version)
            .or_default()
            .insert(NameLocation::new(name, location), ratio);
    }

    pub fn insert_target(&mut self, region: impl Into<String>, year: i32, ratio: f64) {
        self.target.entry(region.into()).or_default().insert(year, ratio);
    }

    /// Load `name;location;ratio` lines for one inventory release
    pub fn load_native(&mut self, version: InventoryVersion, text: &str) -> Result<()> {
        for (line, fields) in records(text) {
            let [name, location, ratio] = fields_exact::<3>(line, &fields)?;
            self.insert_native(version, name, location, number(line, ratio)?);
        }
        Ok(())
    }

    /// Load `region;year;ratio` lines; repeated (region, year) pairs are averaged
    pub fn load_target(&mut self, text: &str) -> Result<()> {
        let mut sums: BTreeMap<(String, i32), (f64, usize)> = BTreeMap::new();
        for (line, fields) in records(text) {
            let [region, year, ratio] = fields_exact::<3>(line, &fields)?;
            let year: i32 = year
                .parse()
                .map_err(|e| ScenarioError::parse(line, format!("year '{year}': {e}")))?;
            let entry = sums.entry((region.to_string(), year)).or_insert((0.0, 0));
            entry.0 += number(line, ratio)?;
            entry.1 += 1;
        }
        for ((region, year), (sum, count)) in sums {
            self.insert_target(region, year, sum / count as f64);
        }
        Ok(())
    }

    /// Ratio of the cement produced by `name` at `location`
    pub fn native(&self, version: InventoryVersion, name: &str, location: &str) -> Option<f64> {
        self.native
            .get(&version)?
            .get(&NameLocation::new(name, location))
            .copied()
    }

    /// Scenario ratio for `region`, interpolated to `year`
    pub fn target(&self, region: &str, year: i32) -> Result<f64> {
        self.target
            .get(region)
            .ok_or_else(|| ScenarioError::UnknownRegion(region.to_string()))?
            .interpolate(year)
    }
}

/// Non-empty, non-comment lines split on ';', with 1-based line numbers
fn records(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> + '_ {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| (line_no, line.split(';').map(str::trim).collect()))
}

fn fields_exact<'a, const N: usize>(line: usize, fields: &[&'a str]) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(fields).map_err(|_| {
        ScenarioError::parse(line, format!("expected {N} fields, found {}", fields.len()))
    })
}

fn number(line: usize, field: &str) -> Result<f64> {
    field
        .parse()
        .map_err(|e| ScenarioError::parse(line, format!("'{field}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_fuels() {
        let fuels = FuelTable::builtin().unwrap();
        let coal = fuels.get("hard coal").unwrap();
        assert!(coal.lower_heating_value > 20.0);
        assert_eq!(coal.biogenic_co2_per_mj(), 0.0);

        let wood = fuels.get("wood pellet").unwrap();
        assert_eq!(wood.fossil_co2_per_mj(), 0.0);
        assert!(fuels.get("waste").is_ok());
    }

    #[test]
    fn test_parse_splits_co2_by_biogenic_share() {
        let fuels = FuelTable::parse("waste;20\n", "waste;0.1;0.25\n").unwrap();
        let waste = fuels.get("waste").unwrap();
        assert!((waste.fossil_co2_per_mj() - 0.075).abs() < 1e-12);
        assert!((waste.biogenic_co2_per_mj() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let err = FuelTable::parse("# header\nwaste;abc\n", "").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 2, .. }));

        let err = FuelTable::parse("waste;20\n", "waste;0.1\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_unknown_fuel() {
        let fuels = FuelTable::builtin().unwrap();
        assert_eq!(
            fuels.get("uranium").unwrap_err(),
            ScenarioError::UnknownFuel("uranium".to_string())
        );
    }

    #[test]
    fn test_clinker_ratios_by_version_and_year() {
        let mut ratios = ClinkerRatios::new();
        ratios
            .load_native(
                InventoryVersion::V36,
                "cement production, Portland;CH;0.9\ncement production, limestone 6-10%;CH;0.83\n",
            )
            .unwrap();
        ratios
            .load_target("EUR;2020;0.74\nEUR;2020;0.76\nEUR;2030;0.65\n")
            .unwrap();

        assert_eq!(
            ratios.native(InventoryVersion::V36, "cement production, Portland", "CH"),
            Some(0.9)
        );
        assert_eq!(
            ratios.native(InventoryVersion::V35, "cement production, Portland", "CH"),
            None
        );
        assert!((ratios.target("EUR", 2020).unwrap() - 0.75).abs() < 1e-12);
        assert!((ratios.target("EUR", 2025).unwrap() - 0.70).abs() < 1e-12);
        assert!(ratios.target("CHA", 2025).is_err());
    }
}
