// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Execution Backend Abstraction
//!
//! One capability interface with two independent implementations: a
//! sequential host backend and a data-parallel backend that keeps a
//! device-resident mirror. Given the same inputs both must produce the
//! same slot selection, iteration order, and summation results, so a run
//! can switch execution models without changing its trajectory.
//!
//! No dynamic dispatch happens inside per-slot work; the shared kernel in
//! [`crate::advance`] takes plain data and the backend choice is made once
//! at setup.

mod host;
mod parallel;

pub use host::HostBackend;
pub use parallel::ParallelBackend;

use crate::index_map::SynapseIndexMap;
use crate::store::SynapseStore;
use spikesim_types::{NeuronId, Result, SimError, SummationHandle, SynapseId, SynapseType};

/// Execution backend contract.
///
/// Topology edits flow through the backend so an accelerator-style
/// implementation can keep its mirror bookkeeping in step; the host store
/// remains the authoritative copy for structure.
pub trait Backend: Send {
    /// Backend name for logging/diagnostics
    fn name(&self) -> &'static str;

    /// One-time setup against the initial store and index map
    /// (allocates and fills mirror storage where applicable).
    fn setup(&mut self, store: &SynapseStore, map: &SynapseIndexMap) -> Result<()>;

    /// Add a synapse (first-free-slot policy; see
    /// [`SynapseStore::add_synapse`]).
    fn add_synapse(
        &mut self,
        store: &mut SynapseStore,
        ty: SynapseType,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
        dt: f32,
    ) -> Result<SynapseId>;

    /// Remove a synapse.
    fn erase_synapse(
        &mut self,
        store: &mut SynapseStore,
        neuron: NeuronId,
        id: SynapseId,
    ) -> Result<()>;

    /// Rebuild the index map after topology changes and re-mirror it where
    /// applicable. Must complete before the next advance pass.
    fn rebuild_index_map(&mut self, store: &SynapseStore) -> Result<SynapseIndexMap>;

    /// Advance every occupied synapse by one timestep: decay, perturb on
    /// source firing, accumulate into the destination summation points.
    ///
    /// `fired` and `summation` are neuron-indexed; accumulation order
    /// within each destination is ascending local slot.
    fn advance(
        &mut self,
        store: &mut SynapseStore,
        map: &SynapseIndexMap,
        fired: &[bool],
        summation: &mut [f32],
    ) -> Result<()>;

    /// Copy device-resident state back into the host store. No-op for the
    /// host backend. Must be called before checkpointing or host-side
    /// topology edits.
    fn flush_to_host(&mut self, _store: &mut SynapseStore) -> Result<()> {
        Ok(())
    }
}

/// Backend selector for construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Single-threaded sequential execution
    #[default]
    Host,
    /// Data-parallel execution over a device mirror
    Parallel,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Host => write!(f, "host"),
            BackendKind::Parallel => write!(f, "parallel"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "host" | "cpu" => Ok(BackendKind::Host),
            "parallel" | "accelerator" => Ok(BackendKind::Parallel),
            other => Err(SimError::InvalidParameter {
                name: "backend",
                value: other.to_string(),
                reason: "expected `host` or `parallel`".into(),
            }),
        }
    }
}

/// Create a backend of the requested kind.
pub fn create_backend(kind: BackendKind) -> Box<dyn Backend> {
    match kind {
        BackendKind::Host => Box::new(HostBackend::new()),
        BackendKind::Parallel => Box::new(ParallelBackend::new()),
    }
}
