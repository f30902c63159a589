use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::suppliers::SupplierResolver;
use ndarray::Array1;
use regio_inventory::{Activity, Exchange, Inventory, InventoryError};
use regio_scenario::{variables, FuelTable, ScenarioCoefficients, ScenarioError};
use std::collections::HashMap;

const FOSSIL_CO2: &str = "Carbon dioxide, fossil";
const BIOGENIC_CO2: &str = "Carbon dioxide, non-fossil";
const BIOGENIC_CO2_FLOW: &str = "eba59fd6-f37e-41dc-9ca3-c7ea22d602c7";

const KG_PER_TONNE: f64 = 1000.0;

/// Kiln energy and fuel balance of a region, per tonne of clinker
#[derive(Debug, Clone, PartialEq)]
pub struct KilnBalance {
    /// Weighted thermal energy input, MJ/t
    pub energy_mj_per_t: f64,

    /// Normalized energy share of each configured fuel
    pub fuel_mix: Vec<f64>,

    /// Mass of each configured fuel, kg/t
    pub fuel_kg_per_t: Vec<f64>,

    /// Combustion CO2, kg/t, calcination excluded
    pub fossil_co2_kg_per_t: f64,
    pub biogenic_co2_kg_per_t: f64,
}

/// Rewrites exchange amounts of regional proxies from scenario coefficients
pub struct QuantityRecomputer<'a> {
    config: &'a EngineConfig,
    coefficients: &'a ScenarioCoefficients,
    fuels: &'a FuelTable,
    resolver: SupplierResolver<'a>,
}

impl<'a> QuantityRecomputer<'a> {
    pub fn new(
        config: &'a EngineConfig,
        coefficients: &'a ScenarioCoefficients,
        fuels: &'a FuelTable,
        resolver: SupplierResolver<'a>,
    ) -> Self {
        Self {
            config,
            coefficients,
            fuels,
            resolver,
        }
    }

    /// Kiln energy, fuel masses and combustion CO2 of `region`
    pub fn kiln_balance(&self, region: &str) -> Result<KilnBalance> {
        let shares: Vec<(&str, f64)> = self
            .coefficients
            .with_prefix(region, variables::KILN_SHARE_PREFIX)
            .collect();
        if shares.is_empty() {
            return Err(ScenarioError::unknown_variable(region, variables::KILN_SHARE_PREFIX).into());
        }
        let intensities: HashMap<&str, f64> = self
            .coefficients
            .with_prefix(region, variables::THERMAL_ENERGY_PREFIX)
            .collect();

        let kiln_intensity = shares
            .iter()
            .map(|(kiln, _)| {
                intensities.get(kiln).copied().ok_or_else(|| {
                    ScenarioError::unknown_variable(
                        region,
                        format!("{}, {kiln}", variables::THERMAL_ENERGY_PREFIX),
                    )
                })
            })
            .collect::<std::result::Result<Array1<f64>, _>>()?;
        let kiln_shares = clip_normalize(shares.iter().map(|(_, share)| *share).collect())
            .ok_or_else(|| EngineError::degenerate(region, "kiln production volume"))?;
        let energy_mj_per_t = kiln_shares.dot(&kiln_intensity);

        let raw_mix = self
            .config
            .fuels
            .iter()
            .map(|fuel| self.coefficients.require(region, &fuel.share_variable))
            .collect::<std::result::Result<Array1<f64>, _>>()?;
        let fuel_mix = clip_normalize(raw_mix)
            .ok_or_else(|| EngineError::degenerate(region, "fuel mix"))?;

        let properties = self
            .config
            .fuels
            .iter()
            .map(|fuel| self.fuels.get(&fuel.fuel).copied())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let energy_per_fuel = &fuel_mix * energy_mj_per_t;
        let lhv: Array1<f64> = properties.iter().map(|p| p.lower_heating_value).collect();
        let fossil: Array1<f64> = properties.iter().map(|p| p.fossil_co2_per_mj()).collect();
        let biogenic: Array1<f64> = properties.iter().map(|p| p.biogenic_co2_per_mj()).collect();

        Ok(KilnBalance {
            energy_mj_per_t,
            fuel_kg_per_t: (&energy_per_fuel / &lhv).to_vec(),
            fossil_co2_kg_per_t: energy_per_fuel.dot(&fossil),
            biogenic_co2_kg_per_t: energy_per_fuel.dot(&biogenic),
            fuel_mix: fuel_mix.to_vec(),
        })
    }

    /// Captured over emitted CO2 of `region`, 0 without capture
    pub fn capture_rate(&self, region: &str) -> f64 {
        let captured = self
            .coefficients
            .get(region, variables::CAPTURED_CO2)
            .unwrap_or(0.0);
        let emitted = self
            .coefficients
            .get(region, variables::EMITTED_CO2)
            .unwrap_or(0.0);
        if captured <= 0.0 || emitted <= 0.0 {
            return 0.0;
        }

        let rate = captured / emitted;
        if rate > 1.0 {
            log::warn!("{region}: captured CO2 exceeds emitted CO2 ({rate:.3}), capping at 1");
            return 1.0;
        }
        rate
    }

    /// Rebuild the kiln inputs and emissions of a clinker production proxy
    pub fn update_clinker(
        &self,
        inventory: &Inventory,
        region: &str,
        activity: &mut Activity,
    ) -> Result<()> {
        let balance = self.kiln_balance(region)?;
        let capture_rate = self.capture_rate(region);

        self.strip_fuel_inputs(activity);
        self.add_fuel_inputs(inventory, region, activity, &balance)?;
        if capture_rate > 0.0 {
            self.add_capture_inputs(region, activity, &balance, capture_rate);
        }
        self.update_co2(activity, &balance, capture_rate)?;
        self.update_pollutants(region, activity)?;

        log::debug!(
            "{region}: {:.0} MJ/t clinker, capture rate {:.3}, {} exchanges",
            balance.energy_mj_per_t,
            capture_rate,
            activity.exchanges.len()
        );
        Ok(())
    }

    /// Drop technosphere inputs named after a fuel or electricity
    fn strip_fuel_inputs(&self, activity: &mut Activity) {
        let keywords = &self.config.removed_exchange_keywords;
        let before = activity.exchanges.len();
        activity.exchanges.retain(|exc| {
            !(exc.is_technosphere() && keywords.iter().any(|k| exc.name.contains(k.as_str())))
        });
        log::debug!(
            "{}: dropped {} fuel inputs",
            activity.location,
            before - activity.exchanges.len()
        );
    }

    fn add_fuel_inputs(
        &self,
        inventory: &Inventory,
        region: &str,
        activity: &mut Activity,
        balance: &KilnBalance,
    ) -> Result<()> {
        for (fuel, &kg_per_t) in self.config.fuels.iter().zip(&balance.fuel_kg_per_t) {
            if kg_per_t <= 0.0 {
                continue;
            }

            let mut suppliers = self.resolver.suppliers(
                inventory,
                region,
                &fuel.suppliers,
                &fuel.reference_product,
                "kilogram",
            );
            if suppliers.is_empty() {
                log::warn!(
                    "{region}: no '{}' suppliers, falling back to {}",
                    fuel.fuel,
                    fuel.fallback_region
                );
                suppliers = self.resolver.suppliers(
                    inventory,
                    &fuel.fallback_region,
                    &fuel.suppliers,
                    &fuel.reference_product,
                    "kilogram",
                );
            }
            if suppliers.is_empty() {
                return Err(EngineError::NoSuppliers {
                    fuel: fuel.fuel.clone(),
                    region: region.to_string(),
                    fallback: fuel.fallback_region.clone(),
                });
            }

            activity.exchanges.extend(
                suppliers
                    .iter()
                    .map(|(supplier, share)| supplier.input(share * kg_per_t / KG_PER_TONNE)),
            );
        }
        Ok(())
    }

    /// Electricity and steam needed to capture and compress CO2
    fn add_capture_inputs(
        &self,
        region: &str,
        activity: &mut Activity,
        balance: &KilnBalance,
        capture_rate: f64,
    ) {
        let capture = &self.config.capture;

        // kg CO2 captured per kg clinker
        let captured = capture_rate
            * (balance.fossil_co2_kg_per_t
                + balance.biogenic_co2_kg_per_t
                + capture.calcination_co2_kg_per_t)
            / KG_PER_TONNE;

        let electricity = captured * capture.electricity_kwh_per_kg();

        let recovered_share = self
            .coefficients
            .get(region, variables::RECOVERED_ENERGY_SHARE)
            .unwrap_or(0.0);
        let excess_heat = recovered_share * balance.energy_mj_per_t / KG_PER_TONNE;
        let heat = captured * capture.heat_mj_per_kg - excess_heat;
        if heat < 0.0 {
            log::debug!("{region}: recovered heat exceeds capture steam demand, crediting {:.4} MJ", -heat);
        }

        for (supplier, amount) in [(&capture.electricity, electricity), (&capture.heat, heat)] {
            activity.exchanges.push(Exchange::technosphere(
                supplier.name.clone(),
                supplier.product.clone(),
                supplier.location.as_deref().unwrap_or(region),
                supplier.unit.clone(),
                amount,
            ));
        }
    }

    /// Combustion plus calcination CO2, net of capture
    fn update_co2(
        &self,
        activity: &mut Activity,
        balance: &KilnBalance,
        capture_rate: f64,
    ) -> Result<()> {
        let released = 1.0 - capture_rate;
        let fossil = (balance.fossil_co2_kg_per_t + self.config.capture.calcination_co2_kg_per_t)
            / KG_PER_TONNE
            * released;
        let biogenic = balance.biogenic_co2_kg_per_t / KG_PER_TONNE * released;

        let key = activity.key();
        activity
            .biosphere_flow_mut(FOSSIL_CO2)
            .ok_or_else(|| InventoryError::MissingExchange {
                activity: key,
                exchange: FOSSIL_CO2.to_string(),
            })?
            .set_amount(fossil);

        match activity.biosphere_flow_mut(BIOGENIC_CO2) {
            Some(exc) => exc.set_amount(biogenic),
            None => {
                log::debug!("{}: adding biogenic CO2 exchange", activity.location);
                activity.exchanges.push(
                    Exchange::biosphere(BIOGENIC_CO2, "kilogram", biogenic)
                        .with_categories(["air"])
                        .with_flow(BIOGENIC_CO2_FLOW),
                );
            }
        }
        Ok(())
    }

    /// Set pollutant emissions to the scenario's regional values
    pub fn update_pollutants(&self, region: &str, activity: &mut Activity) -> Result<()> {
        let species = &self.config.emission_species;
        for exc in activity.biosphere_mut() {
            let Some(label) = species.get(&exc.name) else {
                continue;
            };
            let value = self.pollutant_value(region, label)?;

            if exc.amount == 0.0 {
                exc.set_amount(value);
            } else {
                exc.rescale(value / exc.amount);
            }
        }
        Ok(())
    }

    fn pollutant_value(&self, region: &str, label: &str) -> Result<f64> {
        if let Some(value) = self.coefficients.get(region, label) {
            return Ok(value);
        }

        let fallback = &self.config.pollutant_fallback_region;
        log::warn!("{region}: no '{label}' emission data, using {fallback} values");
        Ok(self.coefficients.require(fallback, label)?)
    }

    /// Net grid electricity of a cement production proxy, kWh per kg
    pub fn update_cement_electricity(&self, region: &str, activity: &mut Activity) -> Result<()> {
        let consumption = self
            .coefficients
            .require(region, variables::POWER_CONSUMPTION)?;
        let generation = self
            .coefficients
            .require(region, variables::POWER_GENERATION)?;
        let net = (consumption - generation) / KG_PER_TONNE;

        for exc in activity
            .technosphere_mut()
            .filter(|e| e.unit == "kilowatt hour")
        {
            exc.set_amount(net);
        }
        Ok(())
    }
}

/// Clip to [0, 1] and scale to sum 1; `None` if nothing is left
fn clip_normalize(values: Array1<f64>) -> Option<Array1<f64>> {
    let clipped = values.mapv(|v| v.clamp(0.0, 1.0));
    let total = clipped.sum();
    if total > 0.0 {
        Some(clipped / total)
    } else {
        None
    }
}
