use crate::error::{Result, ScenarioError};
use std::collections::{BTreeMap, BTreeSet, HashMap};

static NO_LOCATIONS: BTreeSet<String> = BTreeSet::new();

/// Correspondence between inventory locations and scenario regions.
///
/// Every fine-grained location belongs to at most one region; locations
/// nobody claims fall into the designated rest-of-world region.
#[derive(Debug, Clone)]
pub struct RegionCrosswalk {
    /// Scenario regions in declaration order
    regions: Vec<String>,

    /// Fine-grained location -> enclosing region
    fine_to_region: HashMap<String, String>,

    /// Region -> enclosed fine-grained locations
    region_to_fine: BTreeMap<String, BTreeSet<String>>,

    rest_of_world: String,
}

impl RegionCrosswalk {
    /// Start a crosswalk whose unmapped locations resolve to `rest_of_world`
    pub fn builder(rest_of_world: impl Into<String>) -> CrosswalkBuilder {
        CrosswalkBuilder {
            rest_of_world: rest_of_world.into(),
            regions: Vec::new(),
        }
    }

    /// Scenario regions, in declaration order
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn is_region(&self, location: &str) -> bool {
        self.region_to_fine.contains_key(location)
    }

    /// Region enclosing `location`; never fails.
    ///
    /// A region name maps to itself, anything unmapped to rest of world.
    pub fn fine_to_region(&self, location: &str) -> &str {
        if let Some(region) = self.fine_to_region.get(location) {
            return region;
        }
        if let Some((region, _)) = self.region_to_fine.get_key_value(location) {
            return region;
        }
        &self.rest_of_world
    }

    /// Fine-grained locations enclosed by `region` (empty if unknown)
    pub fn region_to_fine(&self, region: &str) -> &BTreeSet<String> {
        self.region_to_fine.get(region).unwrap_or(&NO_LOCATIONS)
    }
}

/// Collects region definitions for a [`RegionCrosswalk`]
#[derive(Debug, Clone)]
pub struct CrosswalkBuilder {
    rest_of_world: String,
    regions: Vec<(String, Vec<String>)>,
}

impl CrosswalkBuilder {
    /// Declare a region and the locations it encloses
    pub fn region<I, S>(mut self, region: impl Into<String>, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions.push((
            region.into(),
            locations.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<RegionCrosswalk> {
        let mut regions = Vec::with_capacity(self.regions.len());
        let mut fine_to_region: HashMap<String, String> = HashMap::new();
        let mut region_to_fine: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (region, locations) in self.regions {
            if !region_to_fine.contains_key(&region) {
                regions.push(region.clone());
            }
            let enclosed = region_to_fine.entry(region.clone()).or_default();

            for location in locations {
                if let Some(first) = fine_to_region.get(&location) {
                    if *first != region {
                        return Err(ScenarioError::ConflictingLocation {
                            location,
                            first: first.clone(),
                            second: region,
                        });
                    }
                }
                fine_to_region.insert(location.clone(), region.clone());
                enclosed.insert(location);
            }
        }

        if !region_to_fine.contains_key(&self.rest_of_world) {
            return Err(ScenarioError::UnknownRegion(self.rest_of_world));
        }

        log::debug!(
            "Region crosswalk: {} regions, {} mapped locations",
            regions.len(),
            fine_to_region.len()
        );

        Ok(RegionCrosswalk {
            regions,
            fine_to_region,
            region_to_fine,
            rest_of_world: self.rest_of_world,
        })
    }
}
