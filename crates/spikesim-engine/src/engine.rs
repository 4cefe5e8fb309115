// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Advance Engine
//!
//! Owns the synapse store, its index map, and the execution backend, and
//! drives the per-timestep protocol:
//!
//! 1. rebuild the index map if topology changed (the rebuild barrier; the
//!    map is re-mirrored before any advance may read it)
//! 2. zero the summation points
//! 3. advance every occupied synapse through the backend
//! 4. at the growth cadence, let the policy request topology edits
//!
//! The engine is the only mutator of the store; the index map and the
//! device mirror are read-only consumers told explicitly, via the stale
//! flag, when a rebuild/resync is owed.

use tracing::{debug, info, warn};

use crate::backend::{create_backend, Backend, BackendKind};
use crate::growth::{GrowthPolicy, TopologyOp};
use crate::index_map::SynapseIndexMap;
use crate::neurons::NeuronBuffers;
use crate::snapshot::StoreSnapshot;
use crate::store::SynapseStore;
use spikesim_types::{
    NeuronId, Result, SimError, SimulationParameters, SummationHandle, SynapseId, SynapseType,
};

pub struct SynapseEngine {
    params: SimulationParameters,
    store: SynapseStore,
    map: SynapseIndexMap,
    map_stale: bool,
    backend: Box<dyn Backend>,
    policy: Option<Box<dyn GrowthPolicy>>,
    step_count: u64,
}

impl std::fmt::Debug for SynapseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynapseEngine")
            .field("params", &self.params)
            .field("store", &self.store)
            .field("map", &self.map)
            .field("map_stale", &self.map_stale)
            .field("backend", &self.backend.name())
            .field("policy", &self.policy.as_ref().map(|_| "<policy>"))
            .field("step_count", &self.step_count)
            .finish()
    }
}

impl SynapseEngine {
    /// Validate parameters and set up an empty engine on the given backend.
    pub fn new(
        params: SimulationParameters,
        kind: BackendKind,
    ) -> std::result::Result<Self, Vec<SimError>> {
        params.validate()?;

        let store = SynapseStore::new(&params);
        let map = SynapseIndexMap::build(&store);
        let mut backend = create_backend(kind);
        backend.setup(&store, &map).map_err(|e| vec![e])?;

        info!(
            backend = backend.name(),
            neurons = params.neuron_count,
            slots = params.total_slots(),
            "synapse engine ready"
        );

        Ok(Self {
            params,
            store,
            map,
            map_stale: false,
            backend,
            policy: None,
            step_count: 0,
        })
    }

    /// Restore an engine from a snapshot, on any backend.
    pub fn restore(
        params: SimulationParameters,
        snapshot: &StoreSnapshot,
        kind: BackendKind,
    ) -> std::result::Result<Self, Vec<SimError>> {
        params.validate()?;

        let store = snapshot.restore(&params).map_err(|e| vec![e])?;
        let map = SynapseIndexMap::build(&store);
        let mut backend = create_backend(kind);
        backend.setup(&store, &map).map_err(|e| vec![e])?;

        info!(
            backend = backend.name(),
            occupied = store.total_count,
            "synapse engine restored from snapshot"
        );

        Ok(Self {
            params,
            store,
            map,
            map_stale: false,
            backend,
            policy: None,
            step_count: 0,
        })
    }

    /// Install a growth/pruning policy, reviewed every
    /// `params.growth_interval` steps.
    pub fn set_growth_policy(&mut self, policy: Box<dyn GrowthPolicy>) {
        self.policy = Some(policy);
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn store(&self) -> &SynapseStore {
        &self.store
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn map_is_stale(&self) -> bool {
        self.map_stale
    }

    /// Read access to the index map.
    ///
    /// Reading while a rebuild is owed would iterate a topology that no
    /// longer exists; that is an internal invariant failure, surfaced as
    /// [`SimError::StaleIndexMap`] rather than silently corrupting a step.
    pub fn index_map(&self) -> Result<&SynapseIndexMap> {
        if self.map_stale {
            return Err(SimError::StaleIndexMap);
        }
        Ok(&self.map)
    }

    /// On the first edit of a batch, pull device-resident state back to the
    /// host so the edit sees current response values, and mark the map
    /// stale. Subsequent edits in the same batch skip the flush.
    fn mark_topology_changed(&mut self) -> Result<()> {
        if !self.map_stale {
            self.backend.flush_to_host(&mut self.store)?;
            self.map_stale = true;
        }
        Ok(())
    }

    /// Add a synapse. Capacity misses are reported to the caller and leave
    /// the store untouched; the run may continue.
    pub fn add_synapse(
        &mut self,
        ty: SynapseType,
        source: NeuronId,
        destination: NeuronId,
        sum_target: SummationHandle,
    ) -> Result<SynapseId> {
        self.mark_topology_changed()?;
        self.backend.add_synapse(
            &mut self.store,
            ty,
            source,
            destination,
            sum_target,
            self.params.dt,
        )
    }

    /// Remove a synapse.
    pub fn erase_synapse(&mut self, neuron: NeuronId, id: SynapseId) -> Result<()> {
        self.mark_topology_changed()?;
        self.backend.erase_synapse(&mut self.store, neuron, id)
    }

    /// Zero a synapse's response state and recompute its decay factor.
    pub fn reset_synapse(&mut self, id: SynapseId) -> Result<()> {
        // response state lives device-side between syncs; route through the
        // same flush/rebuild cycle as a topology edit
        self.mark_topology_changed()?;
        self.store.reset_synapse(id, self.params.dt)
    }

    fn ensure_fresh_map(&mut self) -> Result<()> {
        if self.map_stale {
            debug!(step = self.step_count, "rebuilding synapse index map");
            self.map = self.backend.rebuild_index_map(&self.store)?;
            self.map_stale = false;
        }
        Ok(())
    }

    /// Advance the simulation by one timestep.
    ///
    /// `neurons.fired` must describe the current step window; the step
    /// leaves each summation point holding the net postsynaptic input.
    pub fn step(&mut self, neurons: &mut NeuronBuffers) -> Result<()> {
        if neurons.len() != self.params.neuron_count {
            return Err(SimError::InvalidParameter {
                name: "neuron_buffers",
                value: neurons.len().to_string(),
                reason: format!(
                    "buffer length does not match population of {}",
                    self.params.neuron_count
                ),
            });
        }
        self.ensure_fresh_map()?;

        neurons.begin_step();
        self.backend.advance(
            &mut self.store,
            &self.map,
            &neurons.fired,
            &mut neurons.summation_points,
        )?;
        self.step_count += 1;

        if self.params.growth_interval > 0 && self.step_count % self.params.growth_interval == 0 {
            if let Some(mut policy) = self.policy.take() {
                self.backend.flush_to_host(&mut self.store)?;
                let ops = policy.review(self.step_count, &self.store, neurons);
                self.policy = Some(policy);
                self.apply_ops(ops)?;
            }
        }
        Ok(())
    }

    /// Advance up to `steps` timesteps, clamped to `params.max_steps`
    /// total. Returns the number of steps completed so far.
    pub fn run(&mut self, neurons: &mut NeuronBuffers, steps: u64) -> Result<u64> {
        let target = (self.step_count + steps).min(self.params.max_steps);
        while self.step_count < target {
            self.step(neurons)?;
        }
        Ok(self.step_count)
    }

    fn apply_ops(&mut self, ops: Vec<TopologyOp>) -> Result<()> {
        for op in ops {
            let outcome = match op {
                TopologyOp::Add {
                    ty,
                    source,
                    destination,
                    sum_target,
                } => self.add_synapse(ty, source, destination, sum_target).map(|_| ()),
                TopologyOp::Erase { neuron, synapse } => self.erase_synapse(neuron, synapse),
            };
            if let Err(err) = outcome {
                if err.is_recoverable() {
                    warn!(%err, "growth request skipped");
                } else {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Capture a snapshot of the store, syncing device state first.
    ///
    /// Mid-batch (map stale) the host store is already the current copy:
    /// the flush ran at the first edit, and the mirror has not seen the
    /// edits yet. Downloading then would resurrect pre-edit occupancy, so
    /// the sync only runs when the mirror is fresh.
    pub fn snapshot(&mut self) -> Result<StoreSnapshot> {
        if !self.map_stale {
            self.backend.flush_to_host(&mut self.store)?;
        }
        Ok(StoreSnapshot::capture(&self.store))
    }
}
