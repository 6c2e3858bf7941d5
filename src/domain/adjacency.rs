//! Flat adjacency accumulation.
//!
//! Records arrive one at a time and in any order. Each one is merged into a
//! single `node -> direct dependencies` map, and source-less records register
//! their suspect as a root.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::error::TraceError;
use crate::domain::record::{DependencyRecord, NodeId};

/// `node -> ordered, duplicate-free direct dependencies`
pub type FlatAdjacencyMap = HashMap<NodeId, Vec<NodeId>>;

#[derive(Debug, Default)]
pub struct AdjacencyAccumulator {
    flat: FlatAdjacencyMap,
    roots: Vec<NodeId>,
    records: usize,
}

impl AdjacencyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one record into the map. An invalid record leaves the map
    /// untouched.
    pub fn ingest(&mut self, record: DependencyRecord) -> Result<(), TraceError> {
        record.validate()?;
        let DependencyRecord {
            suspect,
            leads,
            source,
        } = record;

        for lead in &leads {
            self.flat.entry(lead.clone()).or_default();
        }

        let suspect_leads = self.flat.entry(suspect.clone()).or_default();
        for lead in leads {
            if !suspect_leads.contains(&lead) {
                suspect_leads.push(lead);
            }
        }

        if source.is_none() && !self.roots.contains(&suspect) {
            debug!(root = %suspect, "registered root");
            self.roots.push(suspect);
        }

        self.records += 1;
        Ok(())
    }

    /// Direct dependencies of `node`. Unknown nodes have none.
    pub fn dependencies(&self, node: &str) -> &[NodeId] {
        self.flat.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node: &str) -> bool {
        self.flat.contains_key(node)
    }

    /// Roots in arrival order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn flat_map(&self) -> &FlatAdjacencyMap {
        &self.flat
    }

    pub fn node_count(&self) -> usize {
        self.flat.len()
    }

    pub fn edge_count(&self) -> usize {
        self.flat.values().map(Vec::len).sum()
    }

    /// Number of records ingested so far.
    pub fn record_count(&self) -> usize {
        self.records
    }
}
