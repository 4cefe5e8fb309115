// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Data-parallel backend over a device mirror.
//!
//! The per-step advance is embarrassingly parallel across occupied slots
//! except for the destination summation points. The arena is
//! destination-major, so splitting the response buffer into per-destination
//! chunks gives every task exclusive ownership of the state it mutates and
//! of exactly one summation point: a race-free combine with no atomics,
//! keeping the host backend's ascending-slot accumulation order, so both
//! paths produce the same sums.
//!
//! Topology edits run against the host store; the mirror is refreshed at
//! the rebuild barrier before the next advance pass (see [`DeviceMirror`]
//! for the sync schedule).

use rayon::prelude::*;

use super::Backend;
use crate::advance::advance_slot;
use crate::index_map::SynapseIndexMap;
use crate::mirror::DeviceMirror;
use crate::store::SynapseStore;
use spikesim_types::{NeuronId, Result, SimError, SummationHandle, SynapseId, SynapseType};

#[derive(Debug, Default)]
pub struct ParallelBackend {
    mirror: DeviceMirror,
}

impl ParallelBackend {
    pub fn new() -> Self {
        Self {
            mirror: DeviceMirror::default(),
        }
    }

    /// Read-only view of the device mirror, for diagnostics and tests.
    pub fn mirror(&self) -> &DeviceMirror {
        &self.mirror
    }
}

impl Backend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn setup(&mut self, store: &SynapseStore, map: &SynapseIndexMap) -> Result<()> {
        self.mirror = DeviceMirror::alloc(store);
        self.mirror.upload_store(store);
        self.mirror.upload_index_map(map);
        self.mirror.verify_against(store)
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
        let id = store.add_synapse(ty, source, destination, sum_target, dt)?;
        // cheap partial sync now; the full structural upload happens at the
        // rebuild barrier
        self.mirror.sync_bookkeeping(store);
        Ok(id)
    }

    fn erase_synapse(
        &mut self,
        store: &mut SynapseStore,
        neuron: NeuronId,
        id: SynapseId,
    ) -> Result<()> {
        store.erase_synapse(neuron, id)?;
        self.mirror.sync_bookkeeping(store);
        Ok(())
    }

    fn rebuild_index_map(&mut self, store: &SynapseStore) -> Result<SynapseIndexMap> {
        let map = SynapseIndexMap::build(store);
        map.verify(store)?;
        self.mirror.upload_store(store);
        self.mirror.upload_index_map(&map);
        self.mirror.verify_against(store)?;
        Ok(map)
    }

    fn advance(
        &mut self,
        _store: &mut SynapseStore,
        _map: &SynapseIndexMap,
        fired: &[bool],
        summation: &mut [f32],
    ) -> Result<()> {
        let max = self.mirror.max_per_neuron;
        let DeviceMirror {
            neuron_count,
            sources,
            sum_targets,
            weights,
            decays,
            psrs,
            incoming,
            offsets,
            ..
        } = &mut self.mirror;

        if offsets.len() != *neuron_count + 1 {
            return Err(SimError::MirrorDiverged(
                "index map was never uploaded to the device".into(),
            ));
        }

        // reads only, shared across tasks
        let sources = &sources[..];
        let sum_targets = &sum_targets[..];
        let weights = &weights[..];
        let decays = &decays[..];
        let incoming = &incoming[..];
        let offsets = &offsets[..];

        // One task per destination: the chunk of `max` response slots and
        // the single summation point it feeds belong to that task alone.
        let contributions: Vec<Option<(u32, f32)>> = psrs
            .par_chunks_mut(max)
            .enumerate()
            .map(|(n, psr_chunk)| {
                let start = offsets[n] as usize;
                let end = offsets[n + 1] as usize;
                let mut target = None;
                let mut acc = 0.0f32;
                for &id in &incoming[start..end] {
                    let g = id.0 as usize;
                    let source_fired = fired[sources[g] as usize];
                    let psr = advance_slot(
                        &mut psr_chunk[g - n * max],
                        decays[g],
                        weights[g],
                        source_fired,
                    );
                    acc += psr;
                    debug_assert!(target.is_none() || target == Some(sum_targets[g]));
                    target = Some(sum_targets[g]);
                }
                target.map(|t| (t, acc))
            })
            .collect();

        for (target, acc) in contributions.into_iter().flatten() {
            summation[target as usize] += acc;
        }
        Ok(())
    }

    fn flush_to_host(&mut self, store: &mut SynapseStore) -> Result<()> {
        self.mirror.download_state(store);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;
    use spikesim_types::SimulationParameters;

    fn build_pair() -> (SynapseStore, SynapseStore, SimulationParameters) {
        let mut params = SimulationParameters::new(4, 2);
        params.synapse_constants.w_exc = 1.0;
        params.synapse_constants.w_inh = 0.5;
        (
            SynapseStore::new(&params),
            SynapseStore::new(&params),
            params,
        )
    }

    #[test]
    fn parallel_matches_host_exactly() {
        let (mut host_store, mut par_store, params) = build_pair();
        let mut host = HostBackend::new();
        let mut parallel = ParallelBackend::new();
        host.setup(&host_store, &SynapseIndexMap::build(&host_store))
            .unwrap();
        parallel
            .setup(&par_store, &SynapseIndexMap::build(&par_store))
            .unwrap();

        let edges = [
            (SynapseType::ExcToExc, 0u32, 1u32),
            (SynapseType::ExcToExc, 2, 1),
            (SynapseType::InhToExc, 3, 2),
            (SynapseType::ExcToInh, 1, 3),
        ];
        for &(ty, src, dst) in &edges {
            host.add_synapse(
                &mut host_store,
                ty,
                NeuronId(src),
                NeuronId(dst),
                SummationHandle(dst),
                params.dt,
            )
            .unwrap();
            parallel
                .add_synapse(
                    &mut par_store,
                    ty,
                    NeuronId(src),
                    NeuronId(dst),
                    SummationHandle(dst),
                    params.dt,
                )
                .unwrap();
        }

        let host_map = host.rebuild_index_map(&host_store).unwrap();
        let par_map = parallel.rebuild_index_map(&par_store).unwrap();
        assert_eq!(host_map, par_map);

        let fired = [true, false, true, true];
        let mut host_sum = vec![0.0f32; 4];
        let mut par_sum = vec![0.0f32; 4];

        for _ in 0..5 {
            host_sum.iter_mut().for_each(|s| *s = 0.0);
            par_sum.iter_mut().for_each(|s| *s = 0.0);
            host.advance(&mut host_store, &host_map, &fired, &mut host_sum)
                .unwrap();
            parallel
                .advance(&mut par_store, &par_map, &fired, &mut par_sum)
                .unwrap();
            assert_eq!(host_sum, par_sum);
        }

        parallel.flush_to_host(&mut par_store).unwrap();
        assert_eq!(host_store.psrs, par_store.psrs);
    }

    #[test]
    fn advance_without_setup_is_a_consistency_error() {
        let (mut store, _, _) = build_pair();
        let mut parallel = ParallelBackend::new();
        let map = SynapseIndexMap::build(&store);
        let err = parallel
            .advance(&mut store, &map, &[false; 4], &mut vec![0.0; 4])
            .unwrap_err();
        assert!(matches!(err, SimError::MirrorDiverged(_)));
    }
}
