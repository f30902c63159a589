use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of edge between an activity and a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Input from (or output to) another activity
    Technosphere,

    /// Elementary flow to or from the environment
    Biosphere,

    /// The activity's own reference output
    Production,
}

/// Uncertainty attached to an exchange amount.
///
/// The descriptor is opaque to the engine: it is carried through clones
/// untouched and reset to [`Uncertainty::None`] whenever an amount is
/// rewritten programmatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Uncertainty {
    /// Scalar amount, no distribution
    #[default]
    None,

    /// Distribution parameters as supplied by the inventory
    Described(serde_json::Value),
}

/// Edge of the inventory graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub kind: ExchangeKind,

    /// Activity name (technosphere/production) or flow name (biosphere)
    pub name: String,

    /// Supplied product, technosphere and production edges only
    pub product: Option<String>,

    /// Supplier location, technosphere and production edges only
    pub location: Option<String>,

    pub unit: String,

    /// Signed quantity per unit of the owning activity's reference product
    pub amount: f64,

    /// Annual output, production edges only
    pub production_volume: Option<f64>,

    pub uncertainty: Uncertainty,

    /// Compartment path of a biosphere flow (e.g. `["air"]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Identifier of the elementary flow in its biosphere database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

impl Exchange {
    /// Input from another activity
    pub fn technosphere(
        name: impl Into<String>,
        product: impl Into<String>,
        location: impl Into<String>,
        unit: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            kind: ExchangeKind::Technosphere,
            name: name.into(),
            product: Some(product.into()),
            location: Some(location.into()),
            unit: unit.into(),
            amount,
            production_volume: None,
            uncertainty: Uncertainty::None,
            categories: Vec::new(),
            flow: None,
        }
    }

    /// Elementary flow
    pub fn biosphere(name: impl Into<String>, unit: impl Into<String>, amount: f64) -> Self {
        Self {
            kind: ExchangeKind::Biosphere,
            name: name.into(),
            product: None,
            location: None,
            unit: unit.into(),
            amount,
            production_volume: None,
            uncertainty: Uncertainty::None,
            categories: Vec::new(),
            flow: None,
        }
    }

    /// Reference output of an activity
    pub fn production(
        name: impl Into<String>,
        product: impl Into<String>,
        location: impl Into<String>,
        unit: impl Into<String>,
        production_volume: f64,
    ) -> Self {
        Self {
            kind: ExchangeKind::Production,
            name: name.into(),
            product: Some(product.into()),
            location: Some(location.into()),
            unit: unit.into(),
            amount: 1.0,
            production_volume: Some(production_volume.max(0.0)),
            uncertainty: Uncertainty::None,
            categories: Vec::new(),
            flow: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    pub fn with_uncertainty(mut self, uncertainty: Uncertainty) -> Self {
        self.uncertainty = uncertainty;
        self
    }

    pub fn is_technosphere(&self) -> bool {
        self.kind == ExchangeKind::Technosphere
    }

    pub fn is_biosphere(&self) -> bool {
        self.kind == ExchangeKind::Biosphere
    }

    pub fn is_production(&self) -> bool {
        self.kind == ExchangeKind::Production
    }

    /// True if this edge points at the given (name, product) family
    pub fn refers_to(&self, name: &str, product: &str) -> bool {
        self.name == name && self.product.as_deref() == Some(product)
    }

    /// Overwrite the amount and drop any uncertainty distribution
    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
        self.uncertainty = Uncertainty::None;
    }

    /// Multiply the amount by `factor`, dropping any uncertainty distribution
    pub fn rescale(&mut self, factor: f64) {
        self.set_amount(self.amount * factor);
    }

    /// Supplier key of a technosphere or production edge
    pub fn target_key(&self) -> Option<ActivityKey> {
        match (&self.product, &self.location) {
            (Some(product), Some(location)) => Some(ActivityKey::new(
                self.name.clone(),
                product.clone(),
                location.clone(),
            )),
            _ => None,
        }
    }
}

/// (name, reference product, location), unique within an inventory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    pub name: String,
    pub reference_product: String,
    pub location: String,
}

impl ActivityKey {
    pub fn new(
        name: impl Into<String>,
        reference_product: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            reference_product: reference_product.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' / '{}' @ {}",
            self.name, self.reference_product, self.location
        )
    }
}

/// (name, reference product) of a family of regional variants
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FamilyKey {
    pub name: String,
    pub reference_product: String,
}

impl FamilyKey {
    pub fn new(name: impl Into<String>, reference_product: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference_product: reference_product.into(),
        }
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' / '{}'", self.name, self.reference_product)
    }
}

/// Production process (a node of the inventory graph)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub reference_product: String,
    pub location: String,
    pub unit: String,

    /// Opaque unique identifier, regenerated on every clone
    pub code: String,

    pub exchanges: Vec<Exchange>,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        reference_product: impl Into<String>,
        location: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            reference_product: reference_product.into(),
            location: location.into(),
            unit: unit.into(),
            code: new_code(),
            exchanges: Vec::new(),
        }
    }

    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchanges.push(exchange);
        self
    }

    pub fn key(&self) -> ActivityKey {
        ActivityKey::new(
            self.name.clone(),
            self.reference_product.clone(),
            self.location.clone(),
        )
    }

    pub fn is_in_family(&self, name: &str, reference_product: &str) -> bool {
        self.name == name && self.reference_product == reference_product
    }

    /// Detached copy relocated to `location` with a fresh code.
    ///
    /// Production edges follow the activity so the copy still supplies itself.
    pub fn relocated_copy(&self, location: &str) -> Self {
        let mut copy = self.clone();
        copy.location = location.to_string();
        copy.code = new_code();
        for exc in copy.exchanges.iter_mut().filter(|e| e.is_production()) {
            exc.location = Some(location.to_string());
        }
        copy
    }

    pub fn production(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|e| e.is_production())
    }

    pub fn technosphere(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|e| e.is_technosphere())
    }

    pub fn technosphere_mut(&mut self) -> impl Iterator<Item = &mut Exchange> {
        self.exchanges.iter_mut().filter(|e| e.is_technosphere())
    }

    pub fn biosphere(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|e| e.is_biosphere())
    }

    pub fn biosphere_mut(&mut self) -> impl Iterator<Item = &mut Exchange> {
        self.exchanges.iter_mut().filter(|e| e.is_biosphere())
    }

    /// First biosphere exchange with exactly this flow name
    pub fn biosphere_flow_mut(&mut self, name: &str) -> Option<&mut Exchange> {
        self.biosphere_mut().find(|e| e.name == name)
    }

    /// Sum of production volumes over all production edges
    pub fn production_volume(&self) -> f64 {
        self.production()
            .map(|e| e.production_volume.unwrap_or(0.0))
            .sum()
    }
}

fn new_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
