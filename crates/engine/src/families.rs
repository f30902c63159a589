use regio_inventory::FamilyKey;
use regio_scenario::InventoryVersion;

const CLINKER_PRODUCTION: (&str, &str) = ("clinker production", "clinker");
const CLINKER_MARKET: (&str, &str) = ("market for clinker", "clinker");
const CEMENT_MARKET: (&str, &str) = ("market for cement", "cement");

const V35_CEMENT_UNSPECIFIED: (&str, &str) =
    ("market for cement, unspecified", "cement, unspecified");
const V36_CEMENT_UNSPECIFIED: (&str, &str) = (
    "cement, all types to generic market for cement, unspecified",
    "cement, unspecified",
);

const V35_CEMENT_TYPES: &[(&str, &str)] = &[
    ("alternative constituents 21-35%", "cement, alternative constituents 21-35%"),
    ("alternative constituents 6-20%", "cement, alternative constituents 6-20%"),
    (
        "blast furnace slag 18-30% and 18-30% other alternative constituents",
        "cement, blast furnace slag 18-30% and 18-30% other alternative constituents",
    ),
    ("blast furnace slag 25-70%, US only", "cement, blast furnace slag 25-70%, US only"),
    (
        "blast furnace slag 31-50% and 31-50% other alternative constituents",
        "cement, blast furnace slag 31-50% and 31-50% other alternative constituents",
    ),
    ("blast furnace slag 36-65%, non-US", "cement, blast furnace slag 36-65%, non-US"),
    ("blast furnace slag 5-25%, US only", "cement, blast furnace slag 5-25%, US only"),
    ("blast furnace slag 70-100%, non-US", "cement, blast furnace slag 70-100%, non-US"),
    ("blast furnace slag 70-100%, US only", "cement, blast furnace slag 70-100%, US only"),
    ("blast furnace slag 81-95%, non-US", "cement, blast furnace slag 81-95%, non-US"),
    ("blast furnace slag, 66-80%, non-US", "cement, blast furnace slag, 66-80%, non-US"),
    ("Portland", "cement, Portland"),
    (
        "pozzolana and fly ash 11-35%, non-US",
        "cement, pozzolana and fly ash 11-35%, non-US",
    ),
    (
        "pozzolana and fly ash 15-40%, US only",
        "cement, pozzolana and fly ash 15-40%, US only",
    ),
    (
        "pozzolana and fly ash 36-55%,non-US",
        "cement, pozzolana and fly ash 36-55%,non-US",
    ),
    (
        "pozzolana and fly ash 5-15%, US only",
        "cement, pozzolana and fly ash 5-15%, US only",
    ),
];

const V36_CEMENT_TYPES: &[(&str, &str)] = &[
    ("Portland", "cement, Portland"),
    ("blast furnace slag 35-70%", "cement, blast furnace slag 35-70%"),
    ("blast furnace slag 6-34%", "cement, blast furnace slag 6-34%"),
    ("limestone 6-10%", "cement, limestone 6-10%"),
    ("pozzolana and fly ash 15-50%", "cement, pozzolana and fly ash 15-50%"),
    ("pozzolana and fly ash 6-14%", "cement, pozzolana and fly ash 6-14%"),
    ("alternative constituents 6-20%", "cement, alternative constituents 6-20%"),
    ("alternative constituents 21-35%", "cement, alternative constituents 21-35%"),
    (
        "blast furnace slag 18-30% and 18-30% other alternative constituents",
        "cement, blast furnace slag 18-30% and 18-30% other alternative constituents",
    ),
    (
        "blast furnace slag 31-50% and 31-50% other alternative constituents",
        "cement, blast furnace slag 31-50% and 31-50% other alternative constituents",
    ),
    ("blast furnace slag 36-65%", "cement, blast furnace slag 36-65%"),
    ("blast furnace slag 66-80%", "cement, blast furnace slag, 66-80%"),
    ("blast furnace slag 81-95%", "cement, blast furnace slag 81-95%"),
    ("pozzolana and fly ash 11-35%", "cement, pozzolana and fly ash 11-35%"),
    ("pozzolana and fly ash 36-55%", "cement, pozzolana and fly ash 36-55%"),
    ("alternative constituents 45%", "cement, alternative constituents 45%"),
    ("blast furnace slag 40-70%", "cement, blast furnace 40-70%"),
    ("pozzolana and fly ash 25-35%", "cement, pozzolana and fly ash 25-35%"),
    ("limestone 21-35%", "cement, limestone 21-35%"),
    ("blast furnace slag 21-35%", "cement, blast furnace slag 21-35%"),
    ("blast furnace slag 25-70%", "cement, blast furnace slag 25-70%"),
    ("blast furnace slag 5-25%", "cement, blast furnace slag 5-25%"),
    ("blast furnace slag 6-20%", "cement, blast furnace slag 6-20%"),
    ("blast furnace slag 70-100%", "cement, blast furnace slag 70-100%"),
    ("pozzolana and fly ash 15-40%", "cement, pozzolana and fly ash 15-40%"),
    ("pozzolana and fly ash 5-15%", "cement, pozzolana and fly ash 5-15%"),
];

/// Activity families regionalized for one inventory release
#[derive(Debug, Clone, PartialEq)]
pub struct CementFamilies {
    pub clinker_production: FamilyKey,
    pub clinker_market: FamilyKey,
    pub cement_unspecified: FamilyKey,
    pub cement_production: Vec<FamilyKey>,
    pub cement_markets: Vec<FamilyKey>,
}

impl CementFamilies {
    pub fn for_version(version: InventoryVersion) -> Self {
        let (unspecified, types) = match version {
            InventoryVersion::V35 => (V35_CEMENT_UNSPECIFIED, V35_CEMENT_TYPES),
            InventoryVersion::V36 => (V36_CEMENT_UNSPECIFIED, V36_CEMENT_TYPES),
        };

        Self {
            clinker_production: family(CLINKER_PRODUCTION),
            clinker_market: family(CLINKER_MARKET),
            cement_unspecified: family(unspecified),
            cement_production: types
                .iter()
                .map(|(variant, product)| {
                    FamilyKey::new(format!("cement production, {variant}"), *product)
                })
                .collect(),
            cement_markets: types
                .iter()
                .map(|(variant, product)| {
                    FamilyKey::new(format!("market for cement, {variant}"), *product)
                })
                .collect(),
        }
    }

    /// Families repointed once more after every family has been built
    pub fn final_relink(&self) -> Vec<FamilyKey> {
        vec![
            self.clinker_production.clone(),
            self.clinker_market.clone(),
            family(CEMENT_MARKET),
            self.cement_unspecified.clone(),
        ]
    }
}

fn family((name, reference_product): (&str, &str)) -> FamilyKey {
    FamilyKey::new(name, reference_product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_differ_in_unspecified_market() {
        let v35 = CementFamilies::for_version(InventoryVersion::V35);
        let v36 = CementFamilies::for_version(InventoryVersion::V36);

        assert_eq!(v35.cement_unspecified.name, "market for cement, unspecified");
        assert_eq!(
            v36.cement_unspecified.name,
            "cement, all types to generic market for cement, unspecified"
        );
        assert_eq!(v35.cement_production.len(), 16);
        assert_eq!(v36.cement_production.len(), 26);
    }

    #[test]
    fn test_production_and_market_share_products() {
        let families = CementFamilies::for_version(InventoryVersion::V36);
        for (production, market) in families
            .cement_production
            .iter()
            .zip(&families.cement_markets)
        {
            assert_eq!(production.reference_product, market.reference_product);
            assert!(production.name.starts_with("cement production, "));
            assert!(market.name.starts_with("market for cement, "));
        }
        assert_eq!(
            families.cement_production[0],
            FamilyKey::new("cement production, Portland", "cement, Portland")
        );
    }
}
