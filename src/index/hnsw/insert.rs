//! HNSW insertion: level assignment, layer descent, bidirectional edge
//! maintenance, and degree pruning.

use crate::error::Result;
use crate::index::hnsw::graph::{HnswInner, HnswNode};
use crate::index::hnsw::search::Neighbor;
use crate::record::VectorRecord;
use std::collections::HashMap;

impl HnswInner {
    /// Inserts a record into the graph. The caller holds the write lock and
    /// has already rejected duplicate ids.
    pub(crate) fn insert_record(&mut self, record: VectorRecord) -> Result<()> {
        let id = record.id.clone();
        let level = self.random_level();

        // First node becomes the entry point.
        if self.entry_point.is_none() {
            self.nodes.insert(id.clone(), HnswNode::new(record, level));
            self.entry_point = Some(id);
            self.max_level = level;
            return Ok(());
        }

        let mut ep = self
            .entry_point
            .clone()
            .expect("entry point present in a non-empty graph");
        let prev_max = self.max_level;

        // Greedy descent through the layers above the new node's level.
        for layer in ((level + 1)..=prev_max).rev() {
            let found = self.search_layer(&record, &ep, 1, layer)?;
            if let Some(nearest) = found.first() {
                ep = nearest.id.clone();
            }
        }

        // Collect neighbors per layer, updating the entry for each descent.
        let top = level.min(prev_max);
        let mut per_layer: Vec<(usize, Vec<Neighbor>)> = Vec::with_capacity(top + 1);
        for layer in (0..=top).rev() {
            let mut found = self.search_layer(&record, &ep, self.config.ef_construction, layer)?;
            found.truncate(self.layer_cap(layer));
            if let Some(nearest) = found.first() {
                ep = nearest.id.clone();
            }
            per_layer.push((layer, found));
        }

        // Materialize the new node with its outgoing edges. Targets below
        // the layer are dropped so every edge at layer L points at a node
        // of level >= L.
        let mut node = HnswNode::new(record, level);
        for (layer, neighbors) in &per_layer {
            for neighbor in neighbors {
                if let Some(existing) = self.nodes.get(&neighbor.id) {
                    if existing.level >= *layer {
                        node.edges[*layer].insert(neighbor.id.clone(), neighbor.distance);
                    }
                }
            }
        }
        self.nodes.insert(id.clone(), node);

        // Write the reverse edges, pruning any neighbor that overflows its cap.
        for (layer, neighbors) in per_layer {
            let cap = self.layer_cap(layer);
            for neighbor in neighbors {
                let Some(existing) = self.nodes.get_mut(&neighbor.id) else {
                    continue;
                };
                if existing.deleted || existing.level < layer {
                    continue;
                }
                existing.edges[layer].insert(id.clone(), neighbor.distance);
                if existing.edges[layer].len() > cap {
                    prune_edges(&mut existing.edges[layer], cap);
                }
            }
        }

        // A node taller than the graph becomes the new entry point.
        if level > prev_max {
            self.max_level = level;
            self.entry_point = Some(id);
        }

        Ok(())
    }

    /// Degree cap for a layer: `2 * m` at layer 0, `m` above.
    pub(crate) fn layer_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            2 * self.config.m
        } else {
            self.config.m
        }
    }
}

/// Shrinks an edge map to its `cap` closest entries (ties broken by id).
fn prune_edges(edges: &mut HashMap<String, f32>, cap: usize) {
    if edges.len() <= cap {
        return;
    }
    let mut sorted: Vec<(String, f32)> = edges.drain().collect();
    sorted.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    sorted.truncate(cap);
    edges.extend(sorted);
}
