use crate::error::{InventoryError, Result};
use crate::types::{Activity, ActivityKey, Exchange};
use std::collections::HashMap;

/// Ordered set of activities, unique by [`ActivityKey`]
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    activities: Vec<Activity>,

    /// ActivityKey -> position in `activities`
    index: HashMap<ActivityKey, usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting duplicate keys
    pub fn from_activities<I>(activities: I) -> Result<Self>
    where
        I: IntoIterator<Item = Activity>,
    {
        let mut inventory = Self::new();
        inventory.extend(activities)?;
        Ok(inventory)
    }

    /// Append an activity
    pub fn insert(&mut self, activity: Activity) -> Result<()> {
        let key = activity.key();
        if self.index.contains_key(&key) {
            return Err(InventoryError::DuplicateActivity(key));
        }
        self.index.insert(key, self.activities.len());
        self.activities.push(activity);
        Ok(())
    }

    /// Append several activities.
    ///
    /// Either all of them are inserted or, on the first duplicate, none is.
    pub fn extend<I>(&mut self, activities: I) -> Result<()>
    where
        I: IntoIterator<Item = Activity>,
    {
        let batch: Vec<Activity> = activities.into_iter().collect();
        let mut seen = HashMap::with_capacity(batch.len());
        for activity in &batch {
            let key = activity.key();
            if self.index.contains_key(&key) || seen.insert(key.clone(), ()).is_some() {
                return Err(InventoryError::DuplicateActivity(key));
            }
        }
        for activity in batch {
            self.index.insert(activity.key(), self.activities.len());
            self.activities.push(activity);
        }
        Ok(())
    }

    pub fn get(&self, key: &ActivityKey) -> Option<&Activity> {
        self.index.get(key).map(|&idx| &self.activities[idx])
    }

    pub fn contains(&self, key: &ActivityKey) -> bool {
        self.index.contains_key(key)
    }

    /// Every exchange of every activity, in graph order
    pub fn all_exchanges_mut(&mut self) -> impl Iterator<Item = &mut Exchange> {
        self.activities
            .iter_mut()
            .flat_map(|activity| activity.exchanges.iter_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    /// Activities of the (name, reference product) family, in graph order
    pub fn family<'a>(
        &'a self,
        name: &'a str,
        reference_product: &'a str,
    ) -> impl Iterator<Item = &'a Activity> + 'a {
        self.activities
            .iter()
            .filter(move |a| a.is_in_family(name, reference_product))
    }

    /// Remove and return every activity of the family, preserving order
    pub fn remove_family(&mut self, name: &str, reference_product: &str) -> Vec<Activity> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.activities)
            .into_iter()
            .partition(|a| a.is_in_family(name, reference_product));
        self.activities = kept;
        self.reindex();

        log::debug!(
            "Removed {} activities of '{}' / '{}'",
            removed.len(),
            name,
            reference_product
        );

        removed
    }

    /// Number of activities
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .activities
            .iter()
            .enumerate()
            .map(|(idx, activity)| (activity.key(), idx))
            .collect();
    }
}
