use regio_inventory::{FamilyKey, Inventory};
use regio_scenario::RegionCrosswalk;

/// Repoints consumers of a regionalized family to its regional proxies
pub struct Relinker<'a> {
    crosswalk: &'a RegionCrosswalk,
}

impl<'a> Relinker<'a> {
    pub fn new(crosswalk: &'a RegionCrosswalk) -> Self {
        Self { crosswalk }
    }

    /// Rewrite every technosphere input of `family` whose location is not a
    /// scenario region to the region enclosing that location.
    ///
    /// Idempotent: a region-valued location is left as is. Returns the
    /// number of exchanges changed.
    pub fn relink(&self, inventory: &mut Inventory, family: &FamilyKey) -> usize {
        let mut changed = 0;
        for exc in inventory.all_exchanges_mut().filter(|e| {
            e.is_technosphere() && e.refers_to(&family.name, &family.reference_product)
        }) {
            let Some(location) = exc.location.as_deref() else {
                continue;
            };
            if self.crosswalk.is_region(location) {
                continue;
            }

            let region = self.crosswalk.fine_to_region(location).to_string();
            exc.location = Some(region);
            changed += 1;
        }

        if changed > 0 {
            log::debug!("Relinked {changed} inputs of {family}");
        }
        changed
    }
}
