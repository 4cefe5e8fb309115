// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Synapse Store
//!
//! Owns all synapse slot memory for the simulation. Neurons hold no synapse
//! state of their own, only the per-neuron occupied count kept here.
//!
//! ## Design Philosophy
//! - **Structure-of-Arrays**: one `Vec` per field, better cache locality and
//!   a trivial byte-level mirror for the parallel backend
//! - **Pre-allocated arena**: capacity is fixed at setup
//!   (`neuron_count * max_synapses_per_neuron` slots) and never reallocates
//!   mid-run, so slot addresses are stable for the lifetime of an occupied
//!   slot
//! - **Destination-major layout**: global index =
//!   `destination * max_synapses_per_neuron + local_slot`, which makes
//!   "synapses feeding neuron N" a contiguous slot range

use spikesim_types::{
    NeuronId, Result, SimError, SimulationParameters, SummationHandle, SynapseClassConstants,
    SynapseId, SynapseType,
};
use tracing::warn;

/// Sparse, growable collection of synapses in a fixed-capacity arena.
///
/// Unoccupied slots keep zeroed weight and response state, so a stray read
/// can never contribute to a summation point.
#[derive(Debug, Clone)]
pub struct SynapseStore {
    /// Number of neurons in the population
    pub neuron_count: usize,

    /// Fixed per-neuron slot capacity
    pub max_per_neuron: usize,

    /// Occupancy flag per slot
    pub in_use: Vec<bool>,

    /// Raw synapse type codes (see [`SynapseType::code`])
    pub type_codes: Vec<u8>,

    /// Source neuron ids
    pub sources: Vec<u32>,

    /// Destination neuron ids
    pub destinations: Vec<u32>,

    /// Destination-side summation point handles
    pub sum_targets: Vec<u32>,

    /// Signed synaptic weights
    pub weights: Vec<f32>,

    /// Decay time constants (seconds)
    pub taus: Vec<f32>,

    /// Precomputed per-step decay factors, `exp(-dt / tau)`
    pub decays: Vec<f32>,

    /// Postsynaptic response state
    pub psrs: Vec<f32>,

    /// Occupied-slot count per destination neuron
    pub synapse_counts: Vec<u16>,

    /// Global occupied-slot count
    pub total_count: usize,

    /// Per-type constants captured at setup
    pub constants: SynapseClassConstants,

    /// Synapses not created because the destination was at capacity
    pub dropped_adds: u64,
}

impl SynapseStore {
    /// Allocate an empty arena sized from the simulation parameters.
    pub fn new(params: &SimulationParameters) -> Self {
        let slots = params.total_slots();
        Self {
            neuron_count: params.neuron_count,
            max_per_neuron: params.max_synapses_per_neuron,
            in_use: vec![false; slots],
            type_codes: vec![0; slots],
            sources: vec![0; slots],
            destinations: vec![0; slots],
            sum_targets: vec![0; slots],
            weights: vec![0.0; slots],
            taus: vec![0.0; slots],
            decays: vec![0.0; slots],
            psrs: vec![0.0; slots],
            synapse_counts: vec![0; params.neuron_count],
            total_count: 0,
            constants: params.synapse_constants,
            dropped_adds: 0,
        }
    }

    /// Total slot capacity of the arena.
    #[inline(always)]
    pub fn total_slots(&self) -> usize {
        self.neuron_count * self.max_per_neuron
    }

    /// Global index of a destination neuron's local slot.
    #[inline(always)]
    pub fn global_index(&self, destination: NeuronId, local_slot: usize) -> SynapseId {
        SynapseId(destination.0 * self.max_per_neuron as u32 + local_slot as u32)
    }

    /// Decompose a global index into (destination, local slot).
    #[inline(always)]
    pub fn slot_of(&self, id: SynapseId) -> (usize, usize) {
        let g = id.0 as usize;
        (g / self.max_per_neuron, g % self.max_per_neuron)
    }

    #[inline]
    fn check_slot(&self, id: SynapseId) -> Result<usize> {
        let g = id.0 as usize;
        if g >= self.total_slots() {
            return Err(SimError::SynapseOutOfRange {
                index: id.0,
                capacity: self.total_slots(),
            });
        }
        Ok(g)
    }

    #[inline]
    fn check_neuron(&self, neuron: NeuronId) -> Result<usize> {
        let n = neuron.0 as usize;
        if n >= self.neuron_count {
            return Err(SimError::NeuronOutOfRange {
                index: neuron.0,
                count: self.neuron_count,
            });
        }
        Ok(n)
    }

    /// Whether a global index addresses an occupied slot.
    #[inline(always)]
    pub fn occupied(&self, id: SynapseId) -> bool {
        (id.0 as usize) < self.total_slots() && self.in_use[id.0 as usize]
    }

    /// Occupied-slot count for a destination neuron.
    #[inline(always)]
    pub fn count_for(&self, neuron: NeuronId) -> usize {
        self.synapse_counts[neuron.0 as usize] as usize
    }

    /// Add a synapse connecting two neurons.
    ///
    /// Scans the destination's slots linearly from slot 0 and takes the
    /// first free one; the lowest free index always wins, which pins down
    /// exactly which physical slot a new synapse occupies on replayed runs.
    ///
    /// A destination already at `max_per_neuron` occupied slots reports
    /// [`SimError::CapacityExceeded`]; the synapse is not created and the
    /// run continues.
    pub fn add_synapse(
        &mut self,
        ty: SynapseType,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
        dt: f32,
    ) -> Result<SynapseId> {
        self.check_neuron(source)?;
        let dst = self.check_neuron(destination)?;

        if self.synapse_counts[dst] as usize >= self.max_per_neuron {
            self.dropped_adds += 1;
            warn!(
                neuron = destination.0,
                limit = self.max_per_neuron,
                dropped_total = self.dropped_adds,
                "synapse not created: destination at capacity"
            );
            return Err(SimError::CapacityExceeded {
                neuron: destination,
                limit: self.max_per_neuron,
            });
        }

        let base = dst * self.max_per_neuron;
        let local = (0..self.max_per_neuron)
            .find(|&s| !self.in_use[base + s])
            .expect("count below capacity implies a free slot");
        let id = self.global_index(destination, local);

        self.create_synapse(id, source, destination, sum_target, dt, ty)?;
        self.synapse_counts[dst] += 1;
        self.total_count += 1;
        Ok(id)
    }

    /// Initialize an already-addressed slot in place.
    ///
    /// Used when slot selection is done by the caller (the mirror path
    /// allocates indices ahead of time); field semantics are identical to
    /// [`SynapseStore::add_synapse`]. Occupancy bookkeeping stays with the
    /// caller; pair direct slot writes with [`SynapseStore::recount`].
    pub fn create_synapse(
        &mut self,
        id: SynapseId,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
        dt: f32,
        ty: SynapseType,
    ) -> Result<()> {
        let g = self.check_slot(id)?;
        self.check_neuron(source)?;
        self.check_neuron(destination)?;

        let tau = self.constants.tau(ty);
        self.in_use[g] = true;
        self.type_codes[g] = ty.code();
        self.sources[g] = source.0;
        self.destinations[g] = destination.0;
        self.sum_targets[g] = sum_target.0;
        self.weights[g] = self.constants.weight(ty);
        self.taus[g] = tau;
        self.psrs[g] = 0.0;
        self.decays[g] = (-dt / tau).exp();
        Ok(())
    }

    /// Remove a synapse from the network.
    ///
    /// Clears occupancy and zeroes the contribution-bearing fields; other
    /// slots are not compacted, so surviving indices stay valid until the
    /// next index-map rebuild.
    pub fn erase_synapse(&mut self, neuron: NeuronId, id: SynapseId) -> Result<()> {
        let n = self.check_neuron(neuron)?;
        let g = self.check_slot(id)?;
        if !self.in_use[g] {
            return Err(SimError::VacantSynapse(id));
        }
        debug_assert_eq!(g / self.max_per_neuron, n, "slot does not belong to neuron");

        self.in_use[g] = false;
        self.weights[g] = 0.0;
        self.psrs[g] = 0.0;
        self.synapse_counts[n] -= 1;
        self.total_count -= 1;
        Ok(())
    }

    /// Zero the time-varying state of a slot and recompute its decay factor.
    pub fn reset_synapse(&mut self, id: SynapseId, dt: f32) -> Result<()> {
        let g = self.check_slot(id)?;
        if !self.in_use[g] {
            return Err(SimError::VacantSynapse(id));
        }
        self.psrs[g] = 0.0;
        self.decays[g] = (-dt / self.taus[g]).exp();
        Ok(())
    }

    /// Advance a single synapse by one timestep: decay, then perturb by the
    /// signed weight if the source fired. Returns the updated response,
    /// which the caller accumulates into the slot's summation target.
    ///
    /// Targeted re-evaluation entry point; the whole-store pass in the
    /// backends applies the same arithmetic via [`crate::advance`].
    pub fn advance_synapse(&mut self, id: SynapseId, source_fired: bool) -> Result<f32> {
        let g = self.check_slot(id)?;
        if !self.in_use[g] {
            return Err(SimError::VacantSynapse(id));
        }
        Ok(crate::advance::advance_slot(
            &mut self.psrs[g],
            self.decays[g],
            self.weights[g],
            source_fired,
        ))
    }

    /// Iterate the global indices of all occupied slots in ascending order.
    pub fn occupied_ids(&self) -> impl Iterator<Item = SynapseId> + '_ {
        self.in_use
            .iter()
            .enumerate()
            .filter(|(_, &used)| used)
            .map(|(g, _)| SynapseId(g as u32))
    }

    /// Recompute per-neuron and global counts from the occupancy flags.
    ///
    /// Needed after direct slot writes ([`SynapseStore::create_synapse`])
    /// or a snapshot restore.
    pub fn recount(&mut self) {
        self.synapse_counts.iter_mut().for_each(|c| *c = 0);
        let mut total = 0;
        for g in 0..self.total_slots() {
            if self.in_use[g] {
                self.synapse_counts[g / self.max_per_neuron] += 1;
                total += 1;
            }
        }
        self.total_count = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(neurons: usize, max_per: usize) -> SynapseStore {
        let mut params = SimulationParameters::new(neurons, max_per);
        params.synapse_constants.w_exc = 1.0;
        params.synapse_constants.w_inh = 1.0;
        SynapseStore::new(&params)
    }

    fn add_ee(s: &mut SynapseStore, src: u32, dst: u32) -> Result<SynapseId> {
        s.add_synapse(
            SynapseType::ExcToExc,
            NeuronId(src),
            NeuronId(dst),
            SummationHandle(dst),
            1e-4,
        )
    }

    #[test]
    fn add_beyond_capacity_reports_and_leaves_count() {
        let mut s = store(4, 2);
        let a = add_ee(&mut s, 0, 1).unwrap();
        let b = add_ee(&mut s, 2, 1).unwrap();
        assert_eq!(s.slot_of(a), (1, 0));
        assert_eq!(s.slot_of(b), (1, 1));

        let err = add_ee(&mut s, 3, 1).unwrap_err();
        assert!(matches!(err, SimError::CapacityExceeded { .. }));
        assert_eq!(s.count_for(NeuronId(1)), 2);
        assert_eq!(s.total_count, 2);
        assert_eq!(s.dropped_adds, 1);
    }

    #[test]
    fn erase_leaves_hole_and_readd_reuses_lowest_slot() {
        let mut s = store(2, 3);
        let first = add_ee(&mut s, 0, 0).unwrap();
        let second = add_ee(&mut s, 1, 0).unwrap();
        add_ee(&mut s, 1, 0).unwrap();

        s.erase_synapse(NeuronId(0), second).unwrap();
        assert!(!s.occupied(second));
        assert!(s.occupied(first));
        assert_eq!(s.count_for(NeuronId(0)), 2);

        // lowest free wins: the hole at local slot 1 is refilled
        let reused = add_ee(&mut s, 1, 0).unwrap();
        assert_eq!(reused, second);
        assert_eq!(s.slot_of(reused), (0, 1));
    }

    #[test]
    fn erased_slot_cannot_contribute() {
        let mut s = store(1, 1);
        let id = add_ee(&mut s, 0, 0).unwrap();
        s.psrs[id.0 as usize] = 0.7;
        s.erase_synapse(NeuronId(0), id).unwrap();
        assert_eq!(s.weights[id.0 as usize], 0.0);
        assert_eq!(s.psrs[id.0 as usize], 0.0);
    }

    #[test]
    fn erase_vacant_slot_is_an_error() {
        let mut s = store(1, 2);
        let err = s.erase_synapse(NeuronId(0), SynapseId(1)).unwrap_err();
        assert!(matches!(err, SimError::VacantSynapse(_)));
    }

    #[test]
    fn create_initializes_type_derived_fields() {
        let mut s = store(2, 2);
        let id = s.global_index(NeuronId(1), 0);
        s.create_synapse(
            id,
            NeuronId(0),
            NeuronId(1),
            SummationHandle(1),
            1e-4,
            SynapseType::InhToExc,
        )
        .unwrap();
        let g = id.0 as usize;
        assert!(s.in_use[g]);
        assert_eq!(s.type_codes[g], SynapseType::InhToExc.code());
        assert_eq!(s.weights[g], -1.0);
        assert_eq!(s.taus[g], s.constants.tau_ie);
        assert_eq!(s.decays[g], (-1e-4f32 / s.constants.tau_ie).exp());

        s.recount();
        assert_eq!(s.count_for(NeuronId(1)), 1);
        assert_eq!(s.total_count, 1);
    }

    #[test]
    fn reset_zeroes_state_and_recomputes_decay() {
        let mut s = store(1, 1);
        let id = add_ee(&mut s, 0, 0).unwrap();
        let g = id.0 as usize;
        s.psrs[g] = 0.5;

        let coarse_dt = 2e-4;
        s.reset_synapse(id, coarse_dt).unwrap();
        assert_eq!(s.psrs[g], 0.0);
        assert_eq!(s.decays[g], (-coarse_dt / s.taus[g]).exp());
    }

    #[test]
    fn targeted_advance_matches_the_kernel() {
        let mut s = store(1, 1);
        let id = add_ee(&mut s, 0, 0).unwrap();
        let g = id.0 as usize;
        s.psrs[g] = 0.8;
        s.decays[g] = 0.5;

        assert_eq!(s.advance_synapse(id, false).unwrap(), 0.4);
        assert_eq!(s.advance_synapse(id, true).unwrap(), 0.4 * 0.5 + 1.0);

        s.erase_synapse(NeuronId(0), id).unwrap();
        assert!(matches!(
            s.advance_synapse(id, true).unwrap_err(),
            SimError::VacantSynapse(_)
        ));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut s = store(2, 2);
        assert!(matches!(
            add_ee(&mut s, 0, 9).unwrap_err(),
            SimError::NeuronOutOfRange { .. }
        ));
        assert!(matches!(
            s.reset_synapse(SynapseId(99), 1e-4).unwrap_err(),
            SimError::SynapseOutOfRange { .. }
        ));
    }

    #[test]
    fn slot_assignment_is_deterministic_across_reruns() {
        let build = || {
            let mut s = store(4, 4);
            let mut ids = Vec::new();
            for (src, dst) in [(0, 2), (1, 2), (3, 2), (0, 3), (2, 0)] {
                ids.push(add_ee(&mut s, src, dst).unwrap());
            }
            ids
        };
        assert_eq!(build(), build());
    }
}
