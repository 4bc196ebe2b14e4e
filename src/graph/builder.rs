//! Graph construction module

use crate::graph::CompressedGraph;
use std::collections::HashMap;

/// Builder for incrementally constructing a follow graph.
///
/// Seed accounts are registered at construction and always occupy indices
/// `0..k`; every other account gets the next index on first sight.
#[derive(Debug)]
pub struct GraphBuilder {
    /// Mapping from account ids to node indices
    id_to_index: HashMap<String, u32>,

    /// Account ids in index order
    node_ids: Vec<String>,

    /// Followed node indices per node, in insertion order
    adjacency_lists: Vec<Vec<u32>>,

    /// Indices of the seed accounts
    seeds: Vec<u32>,
}

impl GraphBuilder {
    /// Create a builder whose restart set is `seed_ids`
    pub fn new<S: AsRef<str>>(seed_ids: &[S]) -> Self {
        let mut builder = Self {
            id_to_index: HashMap::with_capacity(seed_ids.len()),
            node_ids: Vec::with_capacity(seed_ids.len()),
            adjacency_lists: Vec::with_capacity(seed_ids.len()),
            seeds: Vec::with_capacity(seed_ids.len()),
        };

        for id in seed_ids {
            let idx = builder.ensure_index(id.as_ref());
            if !builder.seeds.contains(&idx) {
                builder.seeds.push(idx);
            }
        }

        builder
    }

    /// Get or create the node index for the given account id
    pub fn ensure_index(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());
        self.adjacency_lists.push(Vec::new());

        idx
    }

    /// Add follow edges from `source_id` to every target, keeping duplicates
    pub fn add_edges<S: AsRef<str>>(&mut self, source_id: &str, target_ids: &[S]) {
        let src_idx = self.ensure_index(source_id);
        for target in target_ids {
            let dst_idx = self.ensure_index(target.as_ref());
            self.adjacency_lists[src_idx as usize].push(dst_idx);
        }
    }

    pub fn index_of(&self, id: &str) -> Option<u32> {
        self.id_to_index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn seeds(&self) -> &[u32] {
        &self.seeds
    }

    /// Build the compressed graph
    pub fn build(self) -> CompressedGraph {
        let edge_count: usize = self.adjacency_lists.iter().map(Vec::len).sum();

        let mut offsets = Vec::with_capacity(self.node_ids.len() + 1);
        offsets.push(0);
        let mut edges = Vec::with_capacity(edge_count);

        for list in &self.adjacency_lists {
            edges.extend_from_slice(list);
            offsets.push(edges.len() as u32);
        }

        CompressedGraph {
            node_count: self.node_ids.len(),
            offsets,
            edges,
            node_ids: self.node_ids,
            seeds: self.seeds,
        }
    }
}
