// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulation-wide parameters.
//!
//! Loaded once at setup from whatever configuration front-end the embedding
//! application uses, validated, then treated as read-only for the rest of
//! the run. All decay computations derive from `dt` and the per-type time
//! constants below.

use crate::{SimError, SynapseType};

/// Per-synapse-type time constants and weight magnitudes.
///
/// Defaults follow the classic cortical values: inhibitory-sourced synapses
/// decay with tau = 6 ms, excitatory-sourced with tau = 3 ms.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SynapseClassConstants {
    /// Decay time constant for inhibitory -> inhibitory synapses (seconds)
    pub tau_ii: f32,
    /// Decay time constant for inhibitory -> excitatory synapses (seconds)
    pub tau_ie: f32,
    /// Decay time constant for excitatory -> inhibitory synapses (seconds)
    pub tau_ei: f32,
    /// Decay time constant for excitatory -> excitatory synapses (seconds)
    pub tau_ee: f32,
    /// Unsigned weight magnitude for inhibitory-sourced synapses
    pub w_inh: f32,
    /// Unsigned weight magnitude for excitatory-sourced synapses
    pub w_exc: f32,
}

impl Default for SynapseClassConstants {
    fn default() -> Self {
        Self {
            tau_ii: 6e-3,
            tau_ie: 6e-3,
            tau_ei: 3e-3,
            tau_ee: 3e-3,
            w_inh: 1.0e-8,
            w_exc: 1.0e-8,
        }
    }
}

impl SynapseClassConstants {
    /// Decay time constant for a synapse type (seconds).
    #[inline(always)]
    pub fn tau(&self, ty: SynapseType) -> f32 {
        match ty {
            SynapseType::InhToInh => self.tau_ii,
            SynapseType::InhToExc => self.tau_ie,
            SynapseType::ExcToInh => self.tau_ei,
            SynapseType::ExcToExc => self.tau_ee,
        }
    }

    /// Signed synaptic weight for a type: `sign(type) * magnitude(type)`.
    #[inline(always)]
    pub fn weight(&self, ty: SynapseType) -> f32 {
        let magnitude = match ty {
            SynapseType::InhToInh | SynapseType::InhToExc => self.w_inh,
            SynapseType::ExcToInh | SynapseType::ExcToExc => self.w_exc,
        };
        ty.sign() * magnitude
    }
}

/// Process-wide simulation parameters, read-only after validation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationParameters {
    /// Inner simulation step duration (seconds)
    pub dt: f32,

    /// Maximum number of simulation steps in a run
    pub max_steps: u64,

    /// Steps between growth/pruning policy reviews (0 disables the hook)
    pub growth_interval: u64,

    /// Number of neurons in the population
    pub neuron_count: usize,

    /// Fixed per-neuron synapse slot capacity
    pub max_synapses_per_neuron: usize,

    /// Per-type time constants and weight magnitudes
    pub synapse_constants: SynapseClassConstants,
}

impl SimulationParameters {
    /// Parameters for a population of `neuron_count` neurons with the given
    /// per-neuron slot capacity, everything else at defaults.
    pub fn new(neuron_count: usize, max_synapses_per_neuron: usize) -> Self {
        Self {
            dt: 1e-4,
            max_steps: 10_000,
            growth_interval: 0,
            neuron_count,
            max_synapses_per_neuron,
            synapse_constants: SynapseClassConstants::default(),
        }
    }

    /// Validate the full parameter set.
    ///
    /// Collects every violation rather than stopping at the first, so a bad
    /// configuration file can be fixed in one pass.
    pub fn validate(&self) -> std::result::Result<(), Vec<SimError>> {
        let mut errors = Vec::new();

        if !(self.dt.is_finite() && self.dt > 0.0) {
            errors.push(SimError::InvalidParameter {
                name: "dt",
                value: self.dt.to_string(),
                reason: "step duration must be finite and positive".into(),
            });
        }
        if self.neuron_count == 0 {
            errors.push(SimError::InvalidParameter {
                name: "neuron_count",
                value: "0".into(),
                reason: "population must not be empty".into(),
            });
        }
        if self.max_synapses_per_neuron == 0 {
            errors.push(SimError::InvalidParameter {
                name: "max_synapses_per_neuron",
                value: "0".into(),
                reason: "per-neuron slot capacity must be at least 1".into(),
            });
        }

        let c = &self.synapse_constants;
        for (name, tau) in [
            ("tau_ii", c.tau_ii),
            ("tau_ie", c.tau_ie),
            ("tau_ei", c.tau_ei),
            ("tau_ee", c.tau_ee),
        ] {
            if !(tau.is_finite() && tau > 0.0) {
                errors.push(SimError::InvalidParameter {
                    name,
                    value: tau.to_string(),
                    reason: "time constant must be finite and positive".into(),
                });
            }
        }
        for (name, w) in [("w_inh", c.w_inh), ("w_exc", c.w_exc)] {
            if !(w.is_finite() && w >= 0.0) {
                errors.push(SimError::InvalidParameter {
                    name,
                    value: w.to_string(),
                    reason: "weight magnitude must be finite and non-negative".into(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Total slot count of the synapse arena.
    #[inline(always)]
    pub fn total_slots(&self) -> usize {
        self.neuron_count * self.max_synapses_per_neuron
    }
}
