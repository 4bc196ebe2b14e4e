//! Memory-efficient graph representation

use serde::{Deserialize, Serialize};
use std::mem;

/// Compressed sparse representation of a sampled follow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's edges begin
    /// offsets[i] to offsets[i+1] defines the edge range for node i
    pub offsets: Vec<u32>,

    /// Edge array: concatenated lists of followed nodes
    pub edges: Vec<u32>,

    /// Mapping from node indices to account ids
    pub node_ids: Vec<String>,

    /// Seed node indices (restart set)
    pub seeds: Vec<u32>,
}

impl CompressedGraph {
    /// Get outgoing edges for a node
    pub fn outgoing_edges(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Get out-degree of a node, counting duplicate edges
    pub fn out_degree(&self, node: usize) -> usize {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        end - start
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_id(&self, node: usize) -> Option<&str> {
        self.node_ids.get(node).map(String::as_str)
    }

    /// Seeds always occupy the first indices
    pub fn is_seed(&self, node: usize) -> bool {
        node < self.seeds.len()
    }

    /// Incoming edges per node as `(source, 1 / out_degree(source))`
    pub fn incoming_edges(&self) -> Vec<Vec<(u32, f64)>> {
        let mut incoming = vec![Vec::new(); self.node_count];
        for src in 0..self.node_count {
            let degree = self.out_degree(src);
            if degree == 0 {
                continue;
            }
            let ratio = 1.0 / degree as f64;
            for &dst in self.outgoing_edges(src) {
                incoming[dst as usize].push((src as u32, ratio));
            }
        }
        incoming
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<u32>();
        let edges = self.edges.capacity() * mem::size_of::<u32>();
        let ids = self.node_ids.iter().map(|s| s.capacity()).sum::<usize>();
        let seeds = self.seeds.capacity() * mem::size_of::<u32>();

        base + offsets + edges + ids + seeds
    }
}
