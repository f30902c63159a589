use crate::error::{InventoryError, Result};
use crate::inventory::Inventory;
use crate::types::ActivityKey;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Resolved technosphere input (supplier -> consumer)
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyEdge {
    pub amount: f64,
}

/// Supply relationships of an inventory
pub struct SupplyGraph {
    /// Directed graph (supplier -> consumer)
    pub graph: DiGraph<ActivityKey, SupplyEdge>,

    /// ActivityKey -> NodeIndex mapping
    pub node_index: HashMap<ActivityKey, NodeIndex>,

    /// (consumer, referenced supplier) pairs that match no activity
    pub unresolved: Vec<(ActivityKey, ActivityKey)>,
}

impl SupplyGraph {
    pub fn find_node(&self, key: &ActivityKey) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    /// Activities supplying `key`
    pub fn suppliers(&self, key: &ActivityKey) -> Vec<&ActivityKey> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Activities consuming `key`
    pub fn consumers(&self, key: &ActivityKey) -> Vec<&ActivityKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, key: &ActivityKey, direction: Direction) -> Vec<&ActivityKey> {
        let Some(node) = self.find_node(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                self.graph.node_weight(other)
            })
            .collect()
    }
}

impl Inventory {
    /// Resolve every technosphere input against the activities present
    pub fn supply_graph(&self) -> SupplyGraph {
        let mut graph = DiGraph::new();
        let mut node_index = HashMap::with_capacity(self.len());

        for activity in self.iter() {
            let key = activity.key();
            let idx = graph.add_node(key.clone());
            node_index.insert(key, idx);
        }

        let mut unresolved = Vec::new();
        for activity in self.iter() {
            let consumer = activity.key();
            let consumer_idx = node_index[&consumer];

            for exc in activity.technosphere() {
                let Some(target) = exc.target_key() else {
                    continue;
                };
                match node_index.get(&target) {
                    Some(&supplier_idx) => {
                        graph.add_edge(
                            supplier_idx,
                            consumer_idx,
                            SupplyEdge { amount: exc.amount },
                        );
                    }
                    None => unresolved.push((consumer.clone(), target)),
                }
            }
        }

        log::debug!(
            "Built supply graph: {} nodes, {} edges, {} unresolved",
            graph.node_count(),
            graph.edge_count(),
            unresolved.len()
        );

        SupplyGraph {
            graph,
            node_index,
            unresolved,
        }
    }

    /// Referenced suppliers that do not exist, deduplicated and sorted
    pub fn unresolved_references(&self) -> Vec<ActivityKey> {
        let mut targets: Vec<_> = self
            .supply_graph()
            .unresolved
            .into_iter()
            .map(|(_, target)| target)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Fail if any reference selected by `is_checked` does not resolve
    pub fn check_references<F>(&self, is_checked: F) -> Result<()>
    where
        F: Fn(&ActivityKey) -> bool,
    {
        let dangling: Vec<_> = self
            .unresolved_references()
            .into_iter()
            .filter(|key| is_checked(key))
            .collect();

        if dangling.is_empty() {
            Ok(())
        } else {
            Err(InventoryError::DanglingReferences(dangling))
        }
    }
}
