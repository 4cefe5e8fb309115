// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikesim Engine
//!
//! The simulation core: a sparse, growable synapse store, the per-neuron
//! index map derived from it, and the per-timestep advance protocol, all
//! behind an execution-backend interface with two implementations
//! (sequential host, and data-parallel over a device-resident mirror) that
//! produce numerically consistent results.
//!
//! ## Module map
//! - [`store`]: the synapse slot arena (the foundational data structure)
//! - [`index_map`]: "synapses feeding neuron N" in O(synapses-of-N)
//! - [`advance`]: the per-slot kernel shared by every backend
//! - [`backend`]: host and parallel implementations of one contract
//! - [`mirror`]: host <-> device copy protocol for the parallel path
//! - [`engine`]: the per-timestep driver and growth/pruning cadence
//! - [`snapshot`]: backend-independent serialization for exact resume
//! - [`neurons`]: the neuron collaborator surface (fired flags, summation
//!   points)

pub mod advance;
pub mod backend;
pub mod engine;
pub mod growth;
pub mod index_map;
pub mod mirror;
pub mod neurons;
pub mod snapshot;
pub mod store;

pub use backend::{create_backend, Backend, BackendKind, HostBackend, ParallelBackend};
pub use engine::SynapseEngine;
pub use growth::{GrowthPolicy, NoGrowth, TopologyOp};
pub use index_map::SynapseIndexMap;
pub use mirror::DeviceMirror;
pub use neurons::NeuronBuffers;
pub use snapshot::{StoreSnapshot, SynapseRecord};
pub use store::SynapseStore;
