use crate::error::Result;
use regio_inventory::{Activity, ActivityKey, FamilyKey, Inventory};
use regio_scenario::RegionCrosswalk;
use std::collections::BTreeMap;

/// Regional copies of one activity family, not yet part of the inventory
#[derive(Debug, Clone)]
pub struct FamilyProxies {
    pub family: FamilyKey,

    /// Scenario region -> proxy. Regions without a source have no entry.
    pub proxies: BTreeMap<String, Activity>,

    /// Generic activities taken out of the inventory, in graph order
    removed: Vec<Activity>,
}

impl FamilyProxies {
    /// Identities of the removed generic activities
    pub fn deleted_records(&self) -> Vec<ActivityKey> {
        self.removed.iter().map(Activity::key).collect()
    }

    /// Identities of the proxies
    pub fn created_records(&self) -> Vec<ActivityKey> {
        self.proxies.values().map(Activity::key).collect()
    }

    /// True if the family existed in the inventory at all
    pub fn is_regionalized(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Insert the proxies into the inventory.
    ///
    /// On a duplicate identity nothing is inserted, the generic activities
    /// are put back and the error is returned.
    pub fn commit(self, inventory: &mut Inventory) -> Result<Vec<ActivityKey>> {
        let created = self.created_records();
        if let Err(err) = inventory.extend(self.proxies.into_values()) {
            inventory.extend(self.removed)?;
            return Err(err.into());
        }
        Ok(created)
    }

    /// Drop the proxies and put the generic activities back
    pub fn restore(self, inventory: &mut Inventory) -> Result<()> {
        log::warn!("Restoring generic activities of {}", self.family);
        inventory.extend(self.removed)?;
        Ok(())
    }
}

/// Clones generic activities into one proxy per scenario region
pub struct ProxyFetcher<'a> {
    crosswalk: &'a RegionCrosswalk,

    /// Inventory location used when a region has no activity of its own
    rest_of_world: &'a str,
}

impl<'a> ProxyFetcher<'a> {
    pub fn new(crosswalk: &'a RegionCrosswalk, rest_of_world: &'a str) -> Self {
        Self {
            crosswalk,
            rest_of_world,
        }
    }

    /// Copy the family once per scenario region and remove the originals.
    ///
    /// The source of a region is the family member located inside it (the
    /// last one in graph order if several are), else the rest-of-world
    /// member. Regions with neither are left out.
    pub fn clone_per_region(&self, inventory: &mut Inventory, family: &FamilyKey) -> FamilyProxies {
        let mut sources: BTreeMap<&str, &str> = BTreeMap::new();
        for activity in inventory.family(&family.name, &family.reference_product) {
            let region = self.crosswalk.fine_to_region(&activity.location);
            sources.insert(region, activity.location.as_str());
        }

        let mut proxies = BTreeMap::new();
        for region in self.crosswalk.regions() {
            let source_location = match sources.get(region.as_str()) {
                Some(location) => *location,
                None => self.rest_of_world,
            };
            let source_key = ActivityKey::new(
                family.name.clone(),
                family.reference_product.clone(),
                source_location,
            );

            match inventory.get(&source_key) {
                Some(source) => {
                    if source_location == self.rest_of_world && !sources.contains_key(region.as_str()) {
                        log::warn!("{region}: {} sourced from {}", family, self.rest_of_world);
                    }
                    proxies.insert(region.clone(), source.relocated_copy(region));
                }
                None => {
                    log::warn!("{region}: no source for {}, no proxy created", family);
                }
            }
        }

        let removed = inventory.remove_family(&family.name, &family.reference_product);

        log::info!(
            "Cloned {} into {} regional proxies, removed {} generic activities",
            family,
            proxies.len(),
            removed.len()
        );

        FamilyProxies {
            family: family.clone(),
            proxies,
            removed,
        }
    }
}
