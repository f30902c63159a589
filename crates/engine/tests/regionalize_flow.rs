use pretty_assertions::assert_eq;
use regio_engine::{
    CementRegionalizer, EngineConfig, EngineError, MemoryDatasetLog, RegionalizationInputs,
    Relinker,
};
use regio_inventory::{Activity, ActivityKey, Exchange, FamilyKey, Inventory, InventoryError};
use regio_scenario::{
    variables, ClinkerRatios, FuelTable, InventoryVersion, RegionCrosswalk, ScenarioCoefficients,
    ScenarioTable,
};
use std::collections::HashSet;
use tempfile::TempDir;

const YEAR: i32 = 2030;
const UNSPECIFIED: &str = "cement, all types to generic market for cement, unspecified";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn produces(name: &str, product: &str, location: &str, unit: &str) -> Activity {
    Activity::new(name, product, location, unit)
        .with_exchange(Exchange::production(name, product, location, unit, 1.0))
}

fn input(name: &str, product: &str, location: &str, amount: f64) -> Exchange {
    Exchange::technosphere(name, product, location, "kilogram", amount)
}

/// One generic activity per family at CH, plus fuel suppliers and a consumer
fn inventory() -> Inventory {
    let coal = |location: &str, volume: f64| {
        Activity::new("market for hard coal", "hard coal", location, "kilogram").with_exchange(
            Exchange::production("market for hard coal", "hard coal", location, "kilogram", volume),
        )
    };

    Inventory::from_activities(vec![
        coal("CH", 2.0),
        coal("US", 1.0),
        produces(
            "market for waste plastic, mixture",
            "waste plastic, mixture",
            "CH",
            "kilogram",
        ),
        produces(
            "market for wood pellet, measured as dry mass",
            "wood pellet, measured as dry mass",
            "CH",
            "kilogram",
        ),
        produces("clinker production", "clinker", "CH", "kilogram")
            .with_exchange(input("market for hard coal", "hard coal", "GLO", 0.1))
            .with_exchange(Exchange::technosphere(
                "market for electricity, medium voltage",
                "electricity, medium voltage",
                "CH",
                "kilowatt hour",
                0.04,
            ))
            .with_exchange(Exchange::biosphere("Carbon dioxide, fossil", "kilogram", 0.8))
            .with_exchange(Exchange::biosphere("Sulfur dioxide", "kilogram", 0.0)),
        produces("market for clinker", "clinker", "CH", "kilogram")
            .with_exchange(input("clinker production", "clinker", "CH", 1.0)),
        produces("cement production, Portland", "cement, Portland", "CH", "kilogram")
            .with_exchange(input("market for clinker", "clinker", "CH", 0.9))
            .with_exchange(Exchange::technosphere(
                "market for electricity, medium voltage",
                "electricity, medium voltage",
                "CH",
                "kilowatt hour",
                0.05,
            )),
        produces("market for cement, Portland", "cement, Portland", "CH", "kilogram")
            .with_exchange(input("cement production, Portland", "cement, Portland", "CH", 1.0)),
        produces(
            "market for cement, blast furnace slag 35-70%",
            "cement, blast furnace slag 35-70%",
            "CH",
            "kilogram",
        ),
        produces(UNSPECIFIED, "cement, unspecified", "CH", "kilogram")
            .with_exchange(input("market for cement, Portland", "cement, Portland", "CH", 0.7))
            .with_exchange(input(
                "market for cement, blast furnace slag 35-70%",
                "cement, blast furnace slag 35-70%",
                "CH",
                0.3,
            )),
        Activity::new("concrete production", "concrete", "US", "cubic meter")
            .with_exchange(input(UNSPECIFIED, "cement, unspecified", "US", 300.0)),
    ])
    .unwrap()
}

/// R1 = EUR holds CH; R2 = USA holds only US, which has no cement activities
fn crosswalk() -> RegionCrosswalk {
    RegionCrosswalk::builder("EUR")
        .region("EUR", ["CH"])
        .region("USA", ["US"])
        .build()
        .unwrap()
}

fn coefficients() -> ScenarioCoefficients {
    let mut table = ScenarioTable::new();
    for (region, captured) in [("EUR", 0.0), ("USA", 40.0)] {
        for year in [2020, 2040] {
            table.insert(region, "Production volume share, dry kiln", year, 1.0);
            table.insert(region, "Thermal energy consumption, dry kiln", year, 3500.0);
            table.insert(region, variables::SHARE_WASTE_FUEL, year, 0.1);
            table.insert(region, variables::SHARE_BIOMASS_FUEL, year, 0.1);
            table.insert(region, variables::SHARE_FOSSIL_FUEL, year, 0.8);
            table.insert(region, variables::CAPTURED_CO2, year, captured);
            table.insert(region, variables::EMITTED_CO2, year, 100.0);
            table.insert(region, variables::POWER_CONSUMPTION, year, 100.0);
            table.insert(region, variables::POWER_GENERATION, year, 20.0);
            table.insert(region, "SO2", year, 0.3);
        }
    }
    table.at_year(YEAR).unwrap()
}

fn clinker_ratios() -> ClinkerRatios {
    let mut ratios = ClinkerRatios::new();
    ratios.insert_native(InventoryVersion::V36, "market for cement, Portland", "CH", 0.9);
    ratios.insert_native(
        InventoryVersion::V36,
        "market for cement, blast furnace slag 35-70%",
        "CH",
        0.5,
    );
    for region in ["EUR", "USA"] {
        ratios.insert_target(region, YEAR, 0.7);
    }
    ratios
}

fn config() -> EngineConfig {
    EngineConfig {
        rest_of_world: "CH".to_string(),
        ..EngineConfig::for_version(InventoryVersion::V36)
    }
}

struct Fixture {
    config: EngineConfig,
    crosswalk: RegionCrosswalk,
    coefficients: ScenarioCoefficients,
    fuels: FuelTable,
    ratios: ClinkerRatios,
}

impl Fixture {
    fn new() -> Self {
        Self {
            config: config(),
            crosswalk: crosswalk(),
            coefficients: coefficients(),
            fuels: FuelTable::builtin().unwrap(),
            ratios: clinker_ratios(),
        }
    }

    fn regionalizer(&self) -> CementRegionalizer<'_> {
        CementRegionalizer::new(
            &self.config,
            RegionalizationInputs {
                crosswalk: &self.crosswalk,
                coefficients: &self.coefficients,
                fuels: &self.fuels,
                clinker_ratios: &self.ratios,
            },
        )
    }
}

fn get<'a>(inventory: &'a Inventory, name: &str, product: &str, location: &str) -> &'a Activity {
    inventory
        .get(&ActivityKey::new(name, product, location))
        .unwrap_or_else(|| panic!("missing {name} at {location}"))
}

#[test]
fn clinker_family_cloned_per_region_with_fallback() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap();

    let locations: Vec<_> = inventory
        .family("clinker production", "clinker")
        .map(|a| a.location.as_str())
        .collect();
    assert_eq!(locations, vec!["EUR", "USA"]);
    assert!(!inventory.contains(&ActivityKey::new("clinker production", "clinker", "CH")));

    let eur = get(&inventory, "clinker production", "clinker", "EUR");
    let usa = get(&inventory, "clinker production", "clinker", "USA");
    assert_ne!(eur.code, usa.code);
    assert!(usa
        .production()
        .all(|e| e.location.as_deref() == Some("USA")));
}

#[test]
fn identities_stay_unique() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    let summary = fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap();

    let keys: HashSet<_> = inventory.iter().map(Activity::key).collect();
    assert_eq!(keys.len(), inventory.len());

    // 6 families present, 2 regions each
    assert_eq!(summary.created.len(), 12);
    assert_eq!(summary.deleted.len(), 6);
    assert!(summary.deleted.iter().all(|k| k.location == "CH"));
}

#[test]
fn no_dangling_references_into_regionalized_families() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    let summary = fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap();

    let touched: HashSet<_> = summary
        .created
        .iter()
        .map(|k| (k.name.clone(), k.reference_product.clone()))
        .collect();
    let dangling: Vec<_> = inventory
        .unresolved_references()
        .into_iter()
        .filter(|k| touched.contains(&(k.name.clone(), k.reference_product.clone())))
        .collect();
    assert_eq!(dangling, Vec::<ActivityKey>::new());

    let concrete = get(&inventory, "concrete production", "concrete", "US");
    assert_eq!(concrete.exchanges[0].location.as_deref(), Some("USA"));
}

#[test]
fn capture_inputs_only_where_co2_is_captured() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap();

    let capture_supplier = "market group for electricity, medium voltage";
    let eur = get(&inventory, "clinker production", "clinker", "EUR");
    let usa = get(&inventory, "clinker production", "clinker", "USA");

    assert!(eur.technosphere().all(|e| e.name != capture_supplier));
    assert!(usa.technosphere().any(|e| e.name == capture_supplier));

    // old fuel and grid inputs are gone; scenario fuels are in
    assert!(eur
        .technosphere()
        .all(|e| e.name != "market for electricity, medium voltage"));
    let coal: Vec<_> = eur
        .technosphere()
        .filter(|e| e.name == "market for hard coal")
        .collect();
    assert_eq!(coal.len(), 1);
    assert_eq!(coal[0].location.as_deref(), Some("CH"));

    let fossil = |a: &Activity| {
        a.biosphere()
            .find(|e| e.name == "Carbon dioxide, fossil")
            .map(|e| e.amount)
            .unwrap()
    };
    assert!(fossil(usa) < fossil(eur));

    let so2 = eur.biosphere().find(|e| e.name == "Sulfur dioxide").unwrap();
    assert!((so2.amount - 0.3).abs() < 1e-12);
}

#[test]
fn cement_unspecified_rebalanced_and_cement_electricity_updated() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap();

    let unspecified = get(&inventory, UNSPECIFIED, "cement, unspecified", "USA");
    let shares: Vec<f64> = unspecified.technosphere().map(|e| e.amount).collect();
    assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(shares[0] * 0.9 + shares[1] * 0.5 <= 0.7 + 1e-12);
    assert!(unspecified
        .technosphere()
        .all(|e| e.location.as_deref() == Some("EUR")));

    let portland = get(&inventory, "cement production, Portland", "cement, Portland", "EUR");
    let electricity = portland
        .technosphere()
        .find(|e| e.unit == "kilowatt hour")
        .unwrap();
    assert!((electricity.amount - 0.08).abs() < 1e-12);
}

#[test]
fn dataset_logs_written_to_directory() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let temp = TempDir::new().expect("tempdir");

    fixture
        .regionalizer()
        .run_logged(&mut inventory, temp.path())
        .unwrap();

    let deleted =
        std::fs::read_to_string(temp.path().join("log deleted cement datasets.csv")).unwrap();
    let created =
        std::fs::read_to_string(temp.path().join("log created cement datasets.csv")).unwrap();

    let deleted: Vec<_> = deleted.lines().collect();
    assert_eq!(deleted[0], "dataset name;reference product;location");
    assert_eq!(deleted[1], "clinker production;clinker;CH");
    assert_eq!(deleted.len(), 7);

    assert!(created.lines().any(|l| l == "clinker production;clinker;USA"));
    assert!(created
        .lines()
        .any(|l| l == "market for cement, Portland;cement, Portland;EUR"));
    assert_eq!(created.lines().count(), 13);
}

#[test]
fn relinking_again_changes_nothing() {
    init_logging();
    let fixture = Fixture::new();
    let mut inventory = inventory();
    let mut sink = MemoryDatasetLog::new();

    let regionalizer = fixture.regionalizer();
    regionalizer.run(&mut inventory, &mut sink).unwrap();

    let before: Vec<_> = inventory.iter().cloned().collect();
    let relinker = Relinker::new(&fixture.crosswalk);
    let families = regionalizer.families();
    for family in families
        .final_relink()
        .iter()
        .chain(&families.cement_production)
        .chain(&families.cement_markets)
    {
        assert_eq!(relinker.relink(&mut inventory, family), 0);
    }
    let after: Vec<_> = inventory.iter().cloned().collect();
    assert_eq!(before, after);

    assert_eq!(
        relinker.relink(
            &mut inventory,
            &FamilyKey::new("market for hard coal", "hard coal")
        ),
        0
    );
}

#[test]
fn region_without_source_leaves_dangling_consumer() {
    init_logging();
    let mut fixture = Fixture::new();
    // no activity at the rest-of-world location, so USA gets no proxy
    fixture.config.rest_of_world = "RoW".to_string();

    let mut inventory = Inventory::from_activities(vec![
        produces("market for clinker", "clinker", "CH", "kilogram"),
        Activity::new("cement grinding", "cement", "US", "kilogram")
            .with_exchange(input("market for clinker", "clinker", "US", 0.9)),
    ])
    .unwrap();
    let mut sink = MemoryDatasetLog::new();

    let err = fixture
        .regionalizer()
        .run(&mut inventory, &mut sink)
        .unwrap_err();

    match err {
        EngineError::Inventory(InventoryError::DanglingReferences(keys)) => {
            assert_eq!(keys, vec![ActivityKey::new("market for clinker", "clinker", "USA")]);
        }
        other => panic!("expected dangling references, got {other}"),
    }
    assert!(inventory.contains(&ActivityKey::new("market for clinker", "clinker", "EUR")));
}
