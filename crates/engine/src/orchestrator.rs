use crate::config::EngineConfig;
use crate::error::Result;
use crate::families::CementFamilies;
use crate::log_sink::{CsvDatasetLog, DatasetLog};
use crate::proxy::{FamilyProxies, ProxyFetcher};
use crate::rebalance::ClinkerRebalancer;
use crate::recompute::QuantityRecomputer;
use crate::relink::Relinker;
use crate::suppliers::SupplierResolver;
use regio_inventory::{ActivityKey, FamilyKey, Inventory};
use regio_scenario::{ClinkerRatios, FuelTable, RegionCrosswalk, ScenarioCoefficients};
use std::path::Path;

/// Read-only data shared by every family of a run
#[derive(Debug, Clone, Copy)]
pub struct RegionalizationInputs<'a> {
    pub crosswalk: &'a RegionCrosswalk,

    /// Scenario values, already frozen to the target year
    pub coefficients: &'a ScenarioCoefficients,

    pub fuels: &'a FuelTable,
    pub clinker_ratios: &'a ClinkerRatios,
}

/// What a run changed in the inventory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub created: Vec<ActivityKey>,
    pub deleted: Vec<ActivityKey>,

    /// Exchanges repointed by the per-family and final relink passes
    pub relinked: usize,

    /// Families with no activity in the inventory
    pub skipped: Vec<FamilyKey>,
}

/// Rewrite applied to the proxies of a family before they are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Fuels, capture energy and emissions
    Clinker,
    /// Constituents moved toward the scenario clinker ratio
    Rebalance,
    /// Net grid electricity
    Electricity,
    /// Plain copy
    Copy,
}

/// Regionalizes the clinker and cement families of an inventory
pub struct CementRegionalizer<'a> {
    config: &'a EngineConfig,
    inputs: RegionalizationInputs<'a>,
    families: CementFamilies,
}

impl<'a> CementRegionalizer<'a> {
    pub fn new(config: &'a EngineConfig, inputs: RegionalizationInputs<'a>) -> Self {
        Self {
            config,
            inputs,
            families: CementFamilies::for_version(config.version),
        }
    }

    pub fn families(&self) -> &CementFamilies {
        &self.families
    }

    /// Run against `inventory`, writing the dataset logs into `dir`
    pub fn run_logged(&self, inventory: &mut Inventory, dir: &Path) -> Result<RunSummary> {
        let mut sink = CsvDatasetLog::create(dir)?;
        self.run(inventory, &mut sink)
    }

    /// Regionalize every family in order.
    ///
    /// Clinker comes first since cement production consumes it, and the
    /// unspecified cement market is rebalanced before the cement types are
    /// built. A failing family is put back as it was and aborts the run;
    /// families finished before it stay regionalized.
    pub fn run(&self, inventory: &mut Inventory, sink: &mut dyn DatasetLog) -> Result<RunSummary> {
        log::info!(
            "Regionalizing cement for {} regions, year {}",
            self.inputs.crosswalk.regions().len(),
            self.inputs.coefficients.year()
        );

        let mut summary = RunSummary::default();
        let families = &self.families;

        self.process(inventory, sink, &families.clinker_production, Stage::Clinker, &mut summary)?;
        self.process(inventory, sink, &families.clinker_market, Stage::Copy, &mut summary)?;
        self.process(
            inventory,
            sink,
            &families.cement_unspecified,
            Stage::Rebalance,
            &mut summary,
        )?;
        for family in &families.cement_production {
            self.process(inventory, sink, family, Stage::Electricity, &mut summary)?;
        }
        for family in &families.cement_markets {
            self.process(inventory, sink, family, Stage::Copy, &mut summary)?;
        }

        sink.record_created(&summary.created)?;

        let relinker = Relinker::new(self.inputs.crosswalk);
        for family in families.final_relink() {
            summary.relinked += relinker.relink(inventory, &family);
        }

        let regionalized: Vec<&FamilyKey> = self
            .all_families()
            .filter(|f| !summary.skipped.contains(f))
            .collect();
        inventory.check_references(|key| {
            regionalized
                .iter()
                .any(|f| f.name == key.name && f.reference_product == key.reference_product)
        })?;

        log::info!(
            "Cement regionalization done: {} created, {} deleted, {} relinked, {} families skipped",
            summary.created.len(),
            summary.deleted.len(),
            summary.relinked,
            summary.skipped.len()
        );

        Ok(summary)
    }

    fn all_families(&self) -> impl Iterator<Item = &FamilyKey> {
        let families = &self.families;
        [
            &families.clinker_production,
            &families.clinker_market,
            &families.cement_unspecified,
        ]
        .into_iter()
        .chain(&families.cement_production)
        .chain(&families.cement_markets)
    }

    /// Clone, rewrite, insert and relink one family
    fn process(
        &self,
        inventory: &mut Inventory,
        sink: &mut dyn DatasetLog,
        family: &FamilyKey,
        stage: Stage,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let fetcher = ProxyFetcher::new(self.inputs.crosswalk, &self.config.rest_of_world);
        let mut proxies = fetcher.clone_per_region(inventory, family);
        if !proxies.is_regionalized() {
            log::info!("{family} not in inventory, skipped");
            summary.skipped.push(family.clone());
            return Ok(());
        }

        if let Err(err) = self.apply(inventory, stage, &mut proxies) {
            log::error!("Failed to build {family}: {err}");
            proxies.restore(inventory)?;
            return Err(err);
        }

        let deleted = proxies.deleted_records();
        let created = proxies.commit(inventory)?;
        sink.record_deleted(&deleted)?;

        summary.relinked += Relinker::new(self.inputs.crosswalk).relink(inventory, family);
        summary.deleted.extend(deleted);
        summary.created.extend(created);
        Ok(())
    }

    fn apply(&self, inventory: &Inventory, stage: Stage, proxies: &mut FamilyProxies) -> Result<()> {
        match stage {
            Stage::Clinker => {
                let recomputer = self.recomputer();
                for (region, proxy) in proxies.proxies.iter_mut() {
                    recomputer.update_clinker(inventory, region, proxy)?;
                }
            }
            Stage::Rebalance => {
                let rebalancer = ClinkerRebalancer::new(self.config, self.inputs.clinker_ratios);
                let year = self.inputs.coefficients.year();
                for (region, proxy) in proxies.proxies.iter_mut() {
                    rebalancer.rebalance_for(proxy, region, year)?;
                }
            }
            Stage::Electricity => {
                let recomputer = self.recomputer();
                for (region, proxy) in proxies.proxies.iter_mut() {
                    recomputer.update_cement_electricity(region, proxy)?;
                }
            }
            Stage::Copy => {}
        }
        Ok(())
    }

    fn recomputer(&self) -> QuantityRecomputer<'_> {
        QuantityRecomputer::new(
            self.config,
            self.inputs.coefficients,
            self.inputs.fuels,
            SupplierResolver::new(self.inputs.crosswalk),
        )
    }
}
