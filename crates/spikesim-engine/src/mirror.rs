// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Device Mirror
//!
//! Device-resident copy of the synapse store and index map used by the
//! parallel backend. The host store stays authoritative for topology; the
//! mirror is authoritative for time-varying response state between explicit
//! sync points.
//!
//! The protocol fixes *when* each copy direction runs:
//! - `upload_store` + `upload_index_map`: once at setup and after any batch
//!   of host-side topology edits, before the next advance pass
//! - `download_state`: before checkpointing or host-side edits, so the host
//!   sees current response state
//! - `sync_bookkeeping`: cheap partial refresh of per-neuron counts and
//!   summation-point handles when only occupancy bookkeeping moved
//!
//! Structural buffers are plain copies of the host arrays; a mirror that
//! disagrees with the host structurally is a fatal internal failure, never
//! a recoverable condition.

use crate::index_map::SynapseIndexMap;
use crate::store::SynapseStore;
use spikesim_types::{Result, SimError, SynapseId};
use tracing::debug;

/// Device-side buffers sized to the arena capacity.
#[derive(Debug, Clone, Default)]
pub struct DeviceMirror {
    pub neuron_count: usize,
    pub max_per_neuron: usize,

    // Store mirror (structure-of-arrays, one buffer per field)
    pub in_use: Vec<bool>,
    pub type_codes: Vec<u8>,
    pub sources: Vec<u32>,
    pub destinations: Vec<u32>,
    pub sum_targets: Vec<u32>,
    pub weights: Vec<f32>,
    pub taus: Vec<f32>,
    pub decays: Vec<f32>,
    pub psrs: Vec<f32>,
    pub synapse_counts: Vec<u16>,
    pub total_count: usize,

    // Index map mirror
    pub incoming: Vec<SynapseId>,
    pub offsets: Vec<u32>,
}

impl DeviceMirror {
    /// Allocate device storage sized to the store's fixed capacity.
    pub fn alloc(store: &SynapseStore) -> Self {
        let slots = store.total_slots();
        debug!(
            slots,
            neurons = store.neuron_count,
            "allocating device mirror"
        );
        Self {
            neuron_count: store.neuron_count,
            max_per_neuron: store.max_per_neuron,
            in_use: vec![false; slots],
            type_codes: vec![0; slots],
            sources: vec![0; slots],
            destinations: vec![0; slots],
            sum_targets: vec![0; slots],
            weights: vec![0.0; slots],
            taus: vec![0.0; slots],
            decays: vec![0.0; slots],
            psrs: vec![0.0; slots],
            synapse_counts: vec![0; store.neuron_count],
            total_count: 0,
            incoming: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Full host -> device copy of the store.
    pub fn upload_store(&mut self, store: &SynapseStore) {
        self.in_use.copy_from_slice(&store.in_use);
        self.type_codes.copy_from_slice(&store.type_codes);
        self.sources.copy_from_slice(&store.sources);
        self.destinations.copy_from_slice(&store.destinations);
        self.sum_targets.copy_from_slice(&store.sum_targets);
        self.weights.copy_from_slice(&store.weights);
        self.taus.copy_from_slice(&store.taus);
        self.decays.copy_from_slice(&store.decays);
        self.psrs.copy_from_slice(&store.psrs);
        self.synapse_counts.copy_from_slice(&store.synapse_counts);
        self.total_count = store.total_count;
        debug!(occupied = self.total_count, "store uploaded to device");
    }

    /// Host -> device copy of a freshly rebuilt index map.
    pub fn upload_index_map(&mut self, map: &SynapseIndexMap) {
        self.incoming.clear();
        self.incoming.extend_from_slice(&map.incoming);
        self.offsets.clear();
        self.offsets.extend_from_slice(&map.offsets);
    }

    /// Full device -> host copy of time-varying and structural state.
    ///
    /// Used before checkpointing and before host-side topology edits.
    pub fn download_state(&self, store: &mut SynapseStore) {
        store.in_use.copy_from_slice(&self.in_use);
        store.type_codes.copy_from_slice(&self.type_codes);
        store.sources.copy_from_slice(&self.sources);
        store.destinations.copy_from_slice(&self.destinations);
        store.sum_targets.copy_from_slice(&self.sum_targets);
        store.weights.copy_from_slice(&self.weights);
        store.taus.copy_from_slice(&self.taus);
        store.decays.copy_from_slice(&self.decays);
        store.psrs.copy_from_slice(&self.psrs);
        store.synapse_counts.copy_from_slice(&self.synapse_counts);
        store.total_count = self.total_count;
        debug!(occupied = store.total_count, "device state downloaded");
    }

    /// Partial host -> device sync: per-neuron counts and summation-point
    /// handles only. Cheaper than `upload_store` when nothing else moved.
    pub fn sync_bookkeeping(&mut self, store: &SynapseStore) {
        self.synapse_counts.copy_from_slice(&store.synapse_counts);
        self.sum_targets.copy_from_slice(&store.sum_targets);
        self.total_count = store.total_count;
    }

    /// Verify the structural mirror invariant against the host store.
    ///
    /// Response state (`psrs`) is deliberately excluded: between syncs the
    /// device copy is the live one. Everything else must match exactly.
    pub fn verify_against(&self, store: &SynapseStore) -> Result<()> {
        fn diverged(field: &str) -> SimError {
            SimError::MirrorDiverged(format!("field `{}` differs between host and device", field))
        }

        if self.in_use != store.in_use {
            return Err(diverged("in_use"));
        }
        if self.type_codes != store.type_codes {
            return Err(diverged("type_codes"));
        }
        if self.sources != store.sources {
            return Err(diverged("sources"));
        }
        if self.destinations != store.destinations {
            return Err(diverged("destinations"));
        }
        if self.sum_targets != store.sum_targets {
            return Err(diverged("sum_targets"));
        }
        if self.weights.iter().zip(&store.weights).any(|(a, b)| a.to_bits() != b.to_bits()) {
            return Err(diverged("weights"));
        }
        if self.decays.iter().zip(&store.decays).any(|(a, b)| a.to_bits() != b.to_bits()) {
            return Err(diverged("decays"));
        }
        if self.synapse_counts != store.synapse_counts {
            return Err(diverged("synapse_counts"));
        }
        if self.total_count != store.total_count {
            return Err(diverged("total_count"));
        }
        Ok(())
    }
}
