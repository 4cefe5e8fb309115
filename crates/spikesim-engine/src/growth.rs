// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Growth/pruning hook.
//!
//! The policy deciding when synapses appear or disappear belongs to the
//! embedding model; the engine only defines the review cadence and applies
//! the requested edits. Any applied edit invalidates the index map, which
//! the engine rebuilds before the next advance pass.

use crate::neurons::NeuronBuffers;
use crate::store::SynapseStore;
use spikesim_types::{NeuronId, SummationHandle, SynapseId, SynapseType};

/// A topology edit requested by a growth policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TopologyOp {
    Add {
        ty: SynapseType,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
    },
    Erase {
        neuron: NeuronId,
        synapse: SynapseId,
    },
}

/// Collaborator-supplied growth/pruning policy, consulted every
/// `growth_interval` steps with a read-only view of the current state.
pub trait GrowthPolicy: Send {
    fn review(
        &mut self,
        step: u64,
        store: &SynapseStore,
        neurons: &NeuronBuffers,
    ) -> Vec<TopologyOp>;
}

/// Policy that never changes topology.
#[derive(Debug, Default)]
pub struct NoGrowth;

impl GrowthPolicy for NoGrowth {
    fn review(&mut self, _: u64, _: &SynapseStore, _: &NeuronBuffers) -> Vec<TopologyOp> {
        Vec::new()
    }
}
