//! # Regio Inventory
//!
//! In-memory life-cycle inventory: activities connected by exchanges.
//!
//! ## Architecture
//!
//! ```text
//! Inventory
//!     │
//!     ├──> Activities (ordered, unique by name/product/location)
//!     │      └─ Exchanges: production, technosphere, biosphere
//!     │
//!     ├──> Key index (ActivityKey -> position)
//!     │
//!     └──> Supply graph (petgraph, built on demand)
//!            ├─ Nodes: activities
//!            ├─ Edges: resolved technosphere inputs
//!            └─ Unresolved inputs reported as dangling references
//! ```

mod error;
mod integrity;
mod inventory;
mod types;

pub use error::{InventoryError, Result};
pub use integrity::{SupplyEdge, SupplyGraph};
pub use inventory::Inventory;
pub use types::{Activity, ActivityKey, Exchange, ExchangeKind, FamilyKey, Uncertainty};
