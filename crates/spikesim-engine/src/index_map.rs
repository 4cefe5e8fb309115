// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Synapse Index Map
//!
//! Derived, read-mostly view over the [`SynapseStore`] answering "which
//! synapse slots feed neuron N" in O(synapses-of-N) instead of scanning the
//! whole arena every step.
//!
//! Rebuilt wholesale whenever the occupancy set changes; treated as
//! immutable in between. The advance pass must never read a stale map;
//! the engine tracks staleness and rebuilds before the next iteration.

use ahash::AHashMap;
use crate::store::SynapseStore;
use spikesim_types::{Result, SimError, SynapseId};

/// Per-neuron index over the synapse arena.
///
/// The forward sequence lists every occupied global index grouped
/// contiguously by destination neuron, in ascending local-slot order within
/// each group. That order is fixed: postsynaptic contributions are summed
/// in sequence order, so it decides the floating-point result and must not
/// vary between builds or backends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynapseIndexMap {
    /// Forward sequence: occupied global indices grouped by destination
    pub incoming: Vec<SynapseId>,

    /// Per-neuron (start, end) table into `incoming`; length
    /// `neuron_count + 1`, neuron `n` owns `incoming[offsets[n]..offsets[n + 1]]`
    pub offsets: Vec<u32>,

    /// Reverse view: source neuron -> global indices originating there
    pub outgoing: AHashMap<u32, Vec<SynapseId>>,
}

impl SynapseIndexMap {
    /// Build the map with a full O(total slots) scan of the store.
    ///
    /// Call after any batch of add/erase operations and before the next
    /// advance pass that iterates per neuron.
    pub fn build(store: &SynapseStore) -> Self {
        let mut incoming = Vec::with_capacity(store.total_count);
        let mut offsets = Vec::with_capacity(store.neuron_count + 1);
        let mut outgoing: AHashMap<u32, Vec<SynapseId>> = AHashMap::new();

        for n in 0..store.neuron_count {
            offsets.push(incoming.len() as u32);
            let base = n * store.max_per_neuron;
            for local in 0..store.max_per_neuron {
                let g = base + local;
                if store.in_use[g] {
                    let id = SynapseId(g as u32);
                    incoming.push(id);
                    outgoing.entry(store.sources[g]).or_default().push(id);
                }
            }
        }
        offsets.push(incoming.len() as u32);

        Self {
            incoming,
            offsets,
            outgoing,
        }
    }

    /// Global indices of the synapses feeding `neuron`, ascending local slot.
    #[inline(always)]
    pub fn incoming_of(&self, neuron: usize) -> &[SynapseId] {
        let start = self.offsets[neuron] as usize;
        let end = self.offsets[neuron + 1] as usize;
        &self.incoming[start..end]
    }

    /// Global indices of the synapses originating at `neuron`.
    #[inline]
    pub fn outgoing_of(&self, neuron: u32) -> &[SynapseId] {
        self.outgoing.get(&neuron).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total entry count; always equals the store's occupied-slot count.
    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    pub fn neuron_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Check the completeness invariant against a store.
    ///
    /// Divergence here means the map was not rebuilt after a topology
    /// change: an internal consistency failure, fatal to the run.
    pub fn verify(&self, store: &SynapseStore) -> Result<()> {
        if self.len() != store.total_count {
            return Err(SimError::IndexMapInconsistent(format!(
                "index map holds {} entries but store has {} occupied slots",
                self.len(),
                store.total_count
            )));
        }
        Ok(())
    }
}
