// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Sequential host backend.
//!
//! Iterates the index map's forward sequence one destination at a time;
//! each step runs to completion with no overlap. This is the reference
//! ordering every other backend must reproduce.

use super::Backend;
use crate::advance::advance_slot;
use crate::index_map::SynapseIndexMap;
use crate::store::SynapseStore;
use spikesim_types::{NeuronId, Result, SummationHandle, SynapseId, SynapseType};

#[derive(Debug, Default)]
pub struct HostBackend;

impl HostBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for HostBackend {
    fn name(&self) -> &'static str {
        "host"
    }

    fn setup(&mut self, _store: &SynapseStore, _map: &SynapseIndexMap) -> Result<()> {
        Ok(())
    }

    fn add_synapse(
        &mut self,
        store: &mut SynapseStore,
        ty: SynapseType,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
        dt: f32,
    ) -> Result<SynapseId> {
        store.add_synapse(ty, source, destination, sum_target, dt)
    }

    fn erase_synapse(
        &mut self,
        store: &mut SynapseStore,
        neuron: NeuronId,
        id: SynapseId,
    ) -> Result<()> {
        store.erase_synapse(neuron, id)
    }

    fn rebuild_index_map(&mut self, store: &SynapseStore) -> Result<SynapseIndexMap> {
        let map = SynapseIndexMap::build(store);
        map.verify(store)?;
        Ok(map)
    }

    fn advance(
        &mut self,
        store: &mut SynapseStore,
        map: &SynapseIndexMap,
        fired: &[bool],
        summation: &mut [f32],
    ) -> Result<()> {
        for n in 0..store.neuron_count {
            for &id in map.incoming_of(n) {
                let g = id.0 as usize;
                let source_fired = fired[store.sources[g] as usize];
                let psr = advance_slot(
                    &mut store.psrs[g],
                    store.decays[g],
                    store.weights[g],
                    source_fired,
                );
                summation[store.sum_targets[g] as usize] += psr;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikesim_types::SimulationParameters;

    #[test]
    fn advance_decays_and_dispatches() {
        let mut params = SimulationParameters::new(2, 2);
        params.synapse_constants.w_exc = 1.0;
        let mut store = SynapseStore::new(&params);
        let mut backend = HostBackend::new();

        let id = backend
            .add_synapse(
                &mut store,
                SynapseType::ExcToExc,
                NeuronId(0),
                NeuronId(1),
                SummationHandle(1),
                params.dt,
            )
            .unwrap();
        let g = id.0 as usize;
        store.psrs[g] = 0.8;
        store.decays[g] = 0.5;

        let map = backend.rebuild_index_map(&store).unwrap();
        let mut summation = vec![0.0f32; 2];

        // no firing: pure decay
        backend
            .advance(&mut store, &map, &[false, false], &mut summation)
            .unwrap();
        assert_eq!(store.psrs[g], 0.4);
        assert_eq!(summation[1], 0.4);

        // source fires: decay then perturb by the signed weight
        summation.iter_mut().for_each(|s| *s = 0.0);
        backend
            .advance(&mut store, &map, &[true, false], &mut summation)
            .unwrap();
        assert_eq!(store.psrs[g], 0.4 * 0.5 + 1.0);
        assert_eq!(summation[1], 0.4 * 0.5 + 1.0);
        assert_eq!(summation[0], 0.0);
    }
}
