use crate::config::{EngineConfig, RebalanceConfig};
use crate::error::{EngineError, Result};
use regio_inventory::{Activity, Exchange};
use regio_scenario::{ClinkerRatios, InventoryVersion};

/// A share adjustment that could not reach its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stalled {
    pub iterations: usize,
    pub ratio: f64,
}

/// Weighted ratio `sum(share * ratio)`
pub fn weighted_ratio(shares: &[f64], ratios: &[f64]) -> f64 {
    shares.iter().zip(ratios).map(|(s, r)| s * r).sum()
}

/// Move share from the highest-ratio to the lowest-ratio supplier until the
/// weighted ratio is at or below `target`.
///
/// Suppliers whose share is zero or below `settings.floor` are neither
/// drawn from nor topped up. Each step moves `min(step, share)`, so the
/// total share is conserved and no share goes negative. Returns the number
/// of steps taken.
pub fn rebalance_shares(
    shares: &mut [f64],
    ratios: &[f64],
    target: f64,
    settings: &RebalanceConfig,
) -> std::result::Result<usize, Stalled> {
    debug_assert_eq!(shares.len(), ratios.len());

    let mut ratio = weighted_ratio(shares, ratios);
    let mut iterations = 0;

    while ratio > target {
        let stalled = Stalled { iterations, ratio };
        if iterations >= settings.max_iterations {
            return Err(stalled);
        }

        let active: Vec<usize> = (0..shares.len())
            .filter(|&i| shares[i] > 0.0 && shares[i] >= settings.floor)
            .collect();
        let highest = active.iter().copied().max_by(|&a, &b| ratios[a].total_cmp(&ratios[b]));
        let lowest = active.iter().copied().min_by(|&a, &b| ratios[a].total_cmp(&ratios[b]));
        let (Some(hi), Some(lo)) = (highest, lowest) else {
            return Err(stalled);
        };
        if ratios[hi] <= ratios[lo] {
            return Err(stalled);
        }

        let moved = settings.step.min(shares[hi]);
        shares[hi] -= moved;
        shares[lo] += moved;

        ratio = weighted_ratio(shares, ratios);
        iterations += 1;
    }

    Ok(iterations)
}

/// Adjusts the constituents of a composite market toward a target clinker ratio
pub struct ClinkerRebalancer<'a> {
    ratios: &'a ClinkerRatios,
    version: InventoryVersion,
    composite_material: &'a str,
    settings: RebalanceConfig,
}

impl<'a> ClinkerRebalancer<'a> {
    pub fn new(config: &'a EngineConfig, ratios: &'a ClinkerRatios) -> Self {
        Self {
            ratios,
            version: config.version,
            composite_material: &config.composite_material,
            settings: config.rebalance,
        }
    }

    /// Rebalance the proxy of `region` against the scenario ratio of `year`
    pub fn rebalance_for(&self, activity: &mut Activity, region: &str, year: i32) -> Result<usize> {
        let target = self.ratios.target(region, year)?;
        self.rebalance(activity, target)
    }

    /// Rewrite the composite inputs of `activity` so their weighted native
    /// clinker ratio does not exceed `target`. Returns the steps taken.
    pub fn rebalance(&self, activity: &mut Activity, target: f64) -> Result<usize> {
        let mut shares = Vec::new();
        let mut ratios = Vec::new();
        for exc in activity.technosphere().filter(|e| self.is_constituent(e)) {
            let location = exc.location.as_deref().unwrap_or_default();
            let ratio = self
                .ratios
                .native(self.version, &exc.name, location)
                .ok_or_else(|| EngineError::MissingClinkerRatio {
                    name: exc.name.clone(),
                    location: location.to_string(),
                })?;
            shares.push(exc.amount);
            ratios.push(ratio);
        }

        let before = weighted_ratio(&shares, &ratios);
        let iterations =
            rebalance_shares(&mut shares, &ratios, target, &self.settings).map_err(|stalled| {
                EngineError::RebalanceExhausted {
                    region: activity.location.clone(),
                    iterations: stalled.iterations,
                    ratio: stalled.ratio,
                    target,
                }
            })?;
        if iterations == 0 {
            return Ok(0);
        }

        let after = weighted_ratio(&shares, &ratios);
        for (exc, share) in activity
            .technosphere_mut()
            .filter(|e| self.is_constituent(e))
            .zip(shares)
        {
            exc.set_amount(share);
        }

        log::debug!(
            "{}: clinker ratio {before:.4} -> {after:.4} in {iterations} steps (target {target:.4})",
            activity.location
        );

        Ok(iterations)
    }

    fn is_constituent(&self, exc: &Exchange) -> bool {
        exc.product
            .as_deref()
            .is_some_and(|p| p.contains(self.composite_material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RebalanceConfig {
        RebalanceConfig::default()
    }

    #[test]
    fn test_no_op_when_already_below_target() {
        let mut shares = vec![0.5, 0.5];
        let steps = rebalance_shares(&mut shares, &[0.9, 0.5], 0.8, &settings()).unwrap();
        assert_eq!(steps, 0);
        assert_eq!(shares, vec![0.5, 0.5]);
    }

    #[test]
    fn test_conserves_total_and_reaches_target() {
        let mut shares = vec![0.4, 0.3, 0.3];
        let ratios = [0.95, 0.75, 0.6];
        let target = 0.7;

        let steps = rebalance_shares(&mut shares, &ratios, target, &settings()).unwrap();

        assert!(steps > 0);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(weighted_ratio(&shares, &ratios) <= target);
        assert!(shares.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_each_step_strictly_decreases_ratio() {
        let ratios = [0.95, 0.75, 0.6];
        let single = RebalanceConfig {
            max_iterations: 1,
            ..settings()
        };

        let mut shares = vec![0.4, 0.3, 0.3];
        let mut previous = weighted_ratio(&shares, &ratios);
        // one step at a time, until the target is met
        loop {
            match rebalance_shares(&mut shares, &ratios, 0.7, &single) {
                Ok(_) => break,
                Err(stalled) => {
                    assert_eq!(stalled.iterations, 1);
                    assert!(stalled.ratio < previous);
                    previous = stalled.ratio;
                }
            }
        }
    }

    #[test]
    fn test_exhausted_supplier_hands_over_to_next_highest() {
        // the top supplier runs dry before the target is met
        let mut shares = vec![0.05, 0.45, 0.5];
        let ratios = [0.95, 0.85, 0.5];
        let target = 0.6;

        rebalance_shares(&mut shares, &ratios, target, &settings()).unwrap();

        assert!(shares[0] < settings().floor);
        assert!(shares[1] < 0.45);
        assert!(weighted_ratio(&shares, &ratios) <= target);
    }

    #[test]
    fn test_unreachable_target_stalls() {
        let mut shares = vec![0.5, 0.5];
        let err = rebalance_shares(&mut shares, &[0.9, 0.8], 0.5, &settings()).unwrap_err();
        assert!(err.ratio > 0.5);
        assert!(err.iterations <= settings().max_iterations);
    }

    #[test]
    fn test_iteration_cap() {
        let capped = RebalanceConfig {
            max_iterations: 3,
            ..settings()
        };
        let mut shares = vec![0.5, 0.5];
        let err = rebalance_shares(&mut shares, &[0.9, 0.1], 0.2, &capped).unwrap_err();
        assert_eq!(err.iterations, 3);
    }

    fn unspecified() -> Activity {
        let input = |variant: &str, location: &str, amount: f64| {
            Exchange::technosphere(
                format!("market for cement, {variant}"),
                format!("cement, {variant}"),
                location,
                "kilogram",
                amount,
            )
        };
        Activity::new(
            "cement, all types to generic market for cement, unspecified",
            "cement, unspecified",
            "EUR",
            "kilogram",
        )
        .with_exchange(input("Portland", "CH", 0.6))
        .with_exchange(Exchange::technosphere(
            "market for transport, freight, lorry",
            "transport, freight, lorry",
            "RER",
            "ton kilometer",
            0.05,
        ))
        .with_exchange(input("blast furnace slag 35-70%", "DE", 0.4))
    }

    fn ratios() -> ClinkerRatios {
        let mut ratios = ClinkerRatios::new();
        ratios.insert_native(InventoryVersion::V36, "market for cement, Portland", "CH", 0.9);
        ratios.insert_native(
            InventoryVersion::V36,
            "market for cement, blast furnace slag 35-70%",
            "DE",
            0.5,
        );
        ratios.insert_target("EUR", 2020, 0.7);
        ratios.insert_target("EUR", 2040, 0.6);
        ratios
    }

    #[test]
    fn test_rebalance_activity_writes_back_in_order() {
        let config = EngineConfig::default();
        let ratios = ratios();
        let mut activity = unspecified();

        let steps = ClinkerRebalancer::new(&config, &ratios)
            .rebalance_for(&mut activity, "EUR", 2030)
            .unwrap();

        assert!(steps > 0);
        let portland = activity.exchanges[0].amount;
        let slag = activity.exchanges[2].amount;
        assert!((portland + slag - 1.0).abs() < 1e-9);
        assert!(portland * 0.9 + slag * 0.5 <= 0.65 + 1e-12);
        // transport is not a constituent
        assert_eq!(activity.exchanges[1].amount, 0.05);
    }

    #[test]
    fn test_missing_native_ratio() {
        let config = EngineConfig::default();
        let ratios = ClinkerRatios::new();
        let mut activity = unspecified();

        let err = ClinkerRebalancer::new(&config, &ratios)
            .rebalance(&mut activity, 0.5)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingClinkerRatio { .. }));
    }
}
