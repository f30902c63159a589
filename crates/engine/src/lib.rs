//! # Regio Engine
//!
//! Regional proxies for the clinker and cement families of an inventory.
//!
//! ## Architecture
//!
//! ```text
//! CementRegionalizer
//!     │
//!     ├──> per family, in order
//!     │      ProxyFetcher ──> clone per region, remove generic activities
//!     │      QuantityRecomputer / ClinkerRebalancer ──> rewrite proxies
//!     │      commit ──> insert proxies (restore originals on failure)
//!     │      Relinker ──> repoint consumers to regions
//!     │
//!     ├──> DatasetLog (deleted per family, created at the end)
//!     │
//!     └──> final relink + dangling reference check
//! ```

mod config;
mod error;
mod families;
mod log_sink;
mod orchestrator;
mod proxy;
mod rebalance;
mod recompute;
mod relink;
mod suppliers;

pub use config::{CaptureConfig, EngineConfig, FuelSupply, RebalanceConfig, SupplierRef};
pub use error::{EngineError, Result};
pub use families::CementFamilies;
pub use log_sink::{CsvDatasetLog, DatasetLog, MemoryDatasetLog};
pub use orchestrator::{CementRegionalizer, RegionalizationInputs, RunSummary};
pub use proxy::{FamilyProxies, ProxyFetcher};
pub use rebalance::{rebalance_shares, weighted_ratio, ClinkerRebalancer, Stalled};
pub use recompute::{KilnBalance, QuantityRecomputer};
pub use relink::Relinker;
pub use suppliers::{SupplierKey, SupplierResolver};
