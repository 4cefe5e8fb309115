// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # spikesim - Spiking Neural Network Simulation Core
//!
//! Simulates large populations of spiking neurons connected by synapses,
//! advancing their state in discrete time steps on one of two
//! interchangeable execution backends: a sequential host backend and a
//! data-parallel backend with a device-resident mirror. Both observe the
//! same slot-selection and iteration order, so runs with the same seed and
//! inputs are numerically equivalent across backends.
//!
//! ## Quick Start
//!
//! ```rust
//! use spikesim::prelude::*;
//!
//! let mut params = SimulationParameters::new(64, 8);
//! params.synapse_constants.w_exc = 1.0;
//!
//! let mut engine = SynapseEngine::new(params, BackendKind::Host).unwrap();
//! let mut neurons = NeuronBuffers::new(64);
//!
//! // connect neuron 3 -> neuron 7
//! let handle = neurons.summation_handle(7);
//! engine
//!     .add_synapse(SynapseType::ExcToExc, NeuronId(3), NeuronId(7), handle)
//!     .unwrap();
//!
//! neurons.set_fired(3, true);
//! engine.step(&mut neurons).unwrap();
//! assert!(neurons.summation_points[7] > 0.0);
//! ```
//!
//! ## Crate layout
//!
//! - [`spikesim_types`]: ids, synapse/neuron type enums, parameters, errors
//! - [`spikesim_layout`]: excitatory/inhibitory and starter-neuron layout
//! - [`spikesim_engine`]: the synapse store, index map, backends, mirror

pub use spikesim_engine as engine;
pub use spikesim_layout as layout;
pub use spikesim_types as types;

/// Common imports for typical simulations.
pub mod prelude {
    pub use spikesim_engine::{
        Backend, BackendKind, GrowthPolicy, NeuronBuffers, StoreSnapshot, SynapseEngine,
        SynapseIndexMap, SynapseStore, TopologyOp,
    };
    pub use spikesim_layout::{Layout, LayoutConfig};
    pub use spikesim_types::{
        NeuronId, NeuronType, Result, SimError, SimulationParameters, SummationHandle,
        SynapseClassConstants, SynapseId, SynapseType,
    };
}
