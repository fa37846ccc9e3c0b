//! Entity co-occurrence graph.
//!
//! Entities are nodes of an undirected `petgraph` graph; an edge weight
//! counts how often two entities appeared in the same entry. A name index
//! gives O(1) node lookups and `mentions` maps entities back to entry ids.
//!
//! # Invariants
//! - At most one edge per entity pair, never a self-loop.
//! - Edge weights only grow through `record_cooccurrence`; `decay` and
//!   `prune` are the sole ways weights shrink or edges disappear.
//! - `nodes` holds exactly the live node indices of `graph`.

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: StableUnGraph<String, f64>,
    /// Entity name to node index.
    nodes: HashMap<String, NodeIndex>,
    /// Entity to ids of entries mentioning it.
    mentions: BTreeMap<String, BTreeSet<String>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn weight(&self, left: &str, right: &str) -> f64 {
        let (Some(&left), Some(&right)) = (self.nodes.get(left), self.nodes.get(right)) else {
            return 0.0;
        };
        self.graph
            .find_edge(left, right)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
            .unwrap_or(0.0)
    }

    /// Adds one unit of weight for every entity pair in `entities`.
    pub fn record_cooccurrence(&mut self, entry_id: &str, entities: &[String]) {
        let mut indices = Vec::with_capacity(entities.len());
        for entity in entities {
            self.mentions
                .entry(entity.clone())
                .or_default()
                .insert(entry_id.to_string());
            let index = self.ensure_node(entity);
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
        for (position, &left) in indices.iter().enumerate() {
            for &right in &indices[position + 1..] {
                match self.graph.find_edge(left, right) {
                    Some(edge) => {
                        if let Some(weight) = self.graph.edge_weight_mut(edge) {
                            *weight += 1.0;
                        }
                    }
                    None => {
                        self.graph.add_edge(left, right, 1.0);
                    }
                }
            }
        }
    }

    /// Forgets which entities `entry_id` mentioned. Edge weights are kept.
    pub fn remove_entry(&mut self, entry_id: &str, entities: &[String]) {
        for entity in entities {
            if let Some(ids) = self.mentions.get_mut(entity) {
                ids.remove(entry_id);
            }
        }
    }

    /// Neighbors of `entity`, heaviest first.
    pub fn neighbors(&self, entity: &str) -> Vec<(String, f64)> {
        let Some(&index) = self.nodes.get(entity) else {
            return Vec::new();
        };
        let mut found: Vec<(String, f64)> = self
            .graph
            .edges(index)
            .filter_map(|edge| {
                let other = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                self.graph
                    .node_weight(other)
                    .map(|name| (name.clone(), *edge.weight()))
            })
            .collect();
        found.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        found
    }

    /// Entries connected to `entities` directly or through one edge, with
    /// a connection strength; `exclude` is never returned.
    pub fn related_entries(&self, entities: &[String], exclude: &str) -> Vec<(String, f64)> {
        let mut strength: HashMap<String, f64> = HashMap::new();
        for entity in entities {
            for id in self.mentions.get(entity).into_iter().flatten() {
                *strength.entry(id.clone()).or_insert(0.0) += 1.0;
            }
            for (neighbor, weight) in self.neighbors(entity) {
                for id in self.mentions.get(&neighbor).into_iter().flatten() {
                    *strength.entry(id.clone()).or_insert(0.0) += weight / (weight + 1.0);
                }
            }
        }
        strength.remove(exclude);
        let mut ranked: Vec<(String, f64)> = strength.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Multiplies every edge weight by `factor` (clamped to `[0, 1]`).
    pub fn decay(&mut self, factor: f64) {
        let factor = factor.clamp(0.0, 1.0);
        let edges: Vec<_> = self.graph.edge_indices().collect();
        for edge in edges {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                *weight *= factor;
            }
        }
    }

    /// Drops edges lighter than `min_weight`, then entities that no entry
    /// mentions and no edge touches. Returns the number of edges removed.
    pub fn prune(&mut self, min_weight: f64) -> usize {
        let before = self.graph.edge_count();
        self.graph.retain_edges(|graph, edge| {
            graph
                .edge_weight(edge)
                .is_some_and(|weight| *weight >= min_weight)
        });
        self.mentions.retain(|_, ids| !ids.is_empty());

        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&index| self.graph.edges(index).next().is_none())
            .filter(|&index| {
                self.graph
                    .node_weight(index)
                    .is_some_and(|name| !self.mentions.contains_key(name))
            })
            .collect();
        for index in orphans {
            if let Some(name) = self.graph.remove_node(index) {
                self.nodes.remove(&name);
            }
        }
        before - self.graph.edge_count()
    }

    fn ensure_node(&mut self, entity: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(entity) {
            return index;
        }
        let index = self.graph.add_node(entity.to_string());
        self.nodes.insert(entity.to_string(), index);
        index
    }
}
