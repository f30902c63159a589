use regio_inventory::{Exchange, Inventory};
use regio_scenario::RegionCrosswalk;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity of a supplying activity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SupplierKey {
    pub name: String,
    pub location: String,
    pub product: String,
    pub unit: String,
}

impl SupplierKey {
    /// Technosphere input from this supplier
    pub fn input(&self, amount: f64) -> Exchange {
        Exchange::technosphere(
            self.name.clone(),
            self.product.clone(),
            self.location.clone(),
            self.unit.clone(),
            amount,
        )
    }
}

/// Finds the activities of a region able to supply a product
pub struct SupplierResolver<'a> {
    crosswalk: &'a RegionCrosswalk,
}

impl<'a> SupplierResolver<'a> {
    pub fn new(crosswalk: &'a RegionCrosswalk) -> Self {
        Self { crosswalk }
    }

    /// Market shares of the matching suppliers located inside `region`.
    ///
    /// Shares follow production volumes and sum to 1. When every match
    /// reports a zero volume the shares are equal. No match yields an
    /// empty map; choosing another region is up to the caller.
    pub fn suppliers(
        &self,
        inventory: &Inventory,
        region: &str,
        candidate_names: &[String],
        reference_product: &str,
        unit: &str,
    ) -> BTreeMap<SupplierKey, f64> {
        let locations = self.crosswalk.region_to_fine(region);

        let mut volumes: BTreeMap<SupplierKey, f64> = BTreeMap::new();
        for activity in inventory.iter().filter(|a| {
            a.reference_product == reference_product
                && a.unit == unit
                && candidate_names.iter().any(|name| *name == a.name)
                && locations.contains(&a.location)
        }) {
            let key = SupplierKey {
                name: activity.name.clone(),
                location: activity.location.clone(),
                product: activity.reference_product.clone(),
                unit: activity.unit.clone(),
            };
            *volumes.entry(key).or_insert(0.0) += activity.production_volume();
        }

        if volumes.is_empty() {
            log::debug!("No suppliers of '{reference_product}' in {region}");
            return volumes;
        }

        let total: f64 = volumes.values().sum();
        if total > 0.0 {
            volumes.values_mut().for_each(|v| *v /= total);
        } else {
            log::warn!(
                "Suppliers of '{reference_product}' in {region} report no production volume, using equal shares"
            );
            let equal = 1.0 / volumes.len() as f64;
            volumes.values_mut().for_each(|v| *v = equal);
        }

        volumes
    }
}
