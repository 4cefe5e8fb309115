// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Neuron-side buffers the synapse core reads and writes.
//!
//! The neuron model itself lives with the embedding application; the
//! synapse core only needs the collaborator surface: who fired this step,
//! and one mutable summation point per neuron for dispatch to accumulate
//! into. Per-neuron synapse counts live in the store.

use spikesim_types::SummationHandle;

/// Structure-of-arrays neuron collaborator state.
#[derive(Debug, Clone)]
pub struct NeuronBuffers {
    /// Fired-this-step flags, written by the neuron model before the
    /// synapse advance pass
    pub fired: Vec<bool>,

    /// Summation points, one per neuron. Zeroed at the start of each step;
    /// after the advance pass each holds the step's net postsynaptic input
    pub summation_points: Vec<f32>,
}

impl NeuronBuffers {
    pub fn new(neuron_count: usize) -> Self {
        Self {
            fired: vec![false; neuron_count],
            summation_points: vec![0.0; neuron_count],
        }
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Handle of a neuron's summation point, as stored in synapse slots.
    #[inline(always)]
    pub fn summation_handle(&self, neuron: usize) -> SummationHandle {
        debug_assert!(neuron < self.summation_points.len());
        SummationHandle(neuron as u32)
    }

    /// Reset the per-step accumulators. Fired flags are left alone; the
    /// neuron model owns them.
    pub fn begin_step(&mut self) {
        self.summation_points.iter_mut().for_each(|s| *s = 0.0);
    }

    pub fn set_fired(&mut self, neuron: usize, fired: bool) {
        self.fired[neuron] = fired;
    }

    pub fn clear_fired(&mut self) {
        self.fired.iter_mut().for_each(|f| *f = false);
    }
}
