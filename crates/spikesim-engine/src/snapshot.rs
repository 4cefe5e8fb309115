// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Store Snapshots
//!
//! Serializable representation of the synapse store: one record per
//! occupied slot, enough to reconstruct occupancy, endpoints, and
//! time-varying state exactly and resume a run bit-identically. The format
//! is backend-independent: a snapshot taken from a parallel run restores
//! into a host run and vice versa.

use ahash::AHashSet;
use crate::store::SynapseStore;
use spikesim_types::{Result, SimError, SimulationParameters, SynapseType};

/// One occupied slot, exactly as stored.
///
/// Weight, tau and decay are recorded rather than re-derived so a restore
/// reproduces the arena even if the active parameter defaults have drifted
/// since the snapshot was taken.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SynapseRecord {
    pub id: u32,
    pub type_code: u8,
    pub source: u32,
    pub destination: u32,
    pub sum_target: u32,
    pub weight: f32,
    pub tau: f32,
    pub decay: f32,
    pub psr: f32,
}

/// Full synapse store snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoreSnapshot {
    pub neuron_count: usize,
    pub max_per_neuron: usize,
    pub records: Vec<SynapseRecord>,
}

impl StoreSnapshot {
    /// Capture every occupied slot in ascending global-index order.
    pub fn capture(store: &SynapseStore) -> Self {
        let records = store
            .occupied_ids()
            .map(|id| {
                let g = id.0 as usize;
                SynapseRecord {
                    id: id.0,
                    type_code: store.type_codes[g],
                    source: store.sources[g],
                    destination: store.destinations[g],
                    sum_target: store.sum_targets[g],
                    weight: store.weights[g],
                    tau: store.taus[g],
                    decay: store.decays[g],
                    psr: store.psrs[g],
                }
            })
            .collect();

        Self {
            neuron_count: store.neuron_count,
            max_per_neuron: store.max_per_neuron,
            records,
        }
    }

    /// Rebuild a store from this snapshot under the given parameters.
    ///
    /// The arena dimensions must match; every record is validated (slot
    /// range, type code, destination consistency, duplicates) before any
    /// state is considered usable.
    pub fn restore(&self, params: &SimulationParameters) -> Result<SynapseStore> {
        if self.neuron_count != params.neuron_count
            || self.max_per_neuron != params.max_synapses_per_neuron
        {
            return Err(SimError::SnapshotMismatch(format!(
                "snapshot is {} neurons x {} slots, parameters say {} x {}",
                self.neuron_count,
                self.max_per_neuron,
                params.neuron_count,
                params.max_synapses_per_neuron
            )));
        }

        let mut store = SynapseStore::new(params);
        let mut seen = AHashSet::with_capacity(self.records.len());

        for record in &self.records {
            let g = record.id as usize;
            if g >= store.total_slots() {
                return Err(SimError::SynapseOutOfRange {
                    index: record.id,
                    capacity: store.total_slots(),
                });
            }
            // rejects unknown codes before any state lands
            SynapseType::try_from(record.type_code)?;
            if record.source as usize >= store.neuron_count
                || record.destination as usize >= store.neuron_count
            {
                return Err(SimError::SnapshotMismatch(format!(
                    "record {} references a neuron outside the population",
                    record.id
                )));
            }
            if g / store.max_per_neuron != record.destination as usize {
                return Err(SimError::SnapshotMismatch(format!(
                    "record {} sits in neuron {}'s slot range but claims destination {}",
                    record.id,
                    g / store.max_per_neuron,
                    record.destination
                )));
            }
            if !seen.insert(record.id) {
                return Err(SimError::SnapshotMismatch(format!(
                    "duplicate record for synapse {}",
                    record.id
                )));
            }

            store.in_use[g] = true;
            store.type_codes[g] = record.type_code;
            store.sources[g] = record.source;
            store.destinations[g] = record.destination;
            store.sum_targets[g] = record.sum_target;
            store.weights[g] = record.weight;
            store.taus[g] = record.tau;
            store.decays[g] = record.decay;
            store.psrs[g] = record.psr;
        }

        store.recount();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikesim_types::{NeuronId, SummationHandle};

    fn populated() -> (SynapseStore, SimulationParameters) {
        let params = SimulationParameters::new(3, 2);
        let mut store = SynapseStore::new(&params);
        for (ty, src, dst) in [
            (SynapseType::ExcToExc, 0u32, 1u32),
            (SynapseType::InhToExc, 2, 1),
            (SynapseType::ExcToInh, 1, 2),
        ] {
            store
                .add_synapse(ty, NeuronId(src), NeuronId(dst), SummationHandle(dst), 1e-4)
                .unwrap();
        }
        store.psrs[2] = 0.125;
        (store, params)
    }

    #[test]
    fn capture_restore_reproduces_the_arena() {
        let (store, params) = populated();
        let snapshot = StoreSnapshot::capture(&store);
        let restored = snapshot.restore(&params).unwrap();

        assert_eq!(restored.in_use, store.in_use);
        assert_eq!(restored.type_codes, store.type_codes);
        assert_eq!(restored.sources, store.sources);
        assert_eq!(restored.destinations, store.destinations);
        assert_eq!(restored.psrs, store.psrs);
        assert_eq!(restored.synapse_counts, store.synapse_counts);
        assert_eq!(restored.total_count, store.total_count);
    }

    #[test]
    fn json_round_trip_is_exact() {
        let (store, params) = populated();
        let snapshot = StoreSnapshot::capture(&store);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: StoreSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let restored = back.restore(&params).unwrap();
        for (a, b) in restored.psrs.iter().zip(&store.psrs) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let (store, _) = populated();
        let snapshot = StoreSnapshot::capture(&store);
        let other = SimulationParameters::new(5, 2);
        assert!(matches!(
            snapshot.restore(&other).unwrap_err(),
            SimError::SnapshotMismatch(_)
        ));
    }

    #[test]
    fn corrupt_records_are_rejected() {
        let (store, params) = populated();
        let mut snapshot = StoreSnapshot::capture(&store);
        snapshot.records[0].type_code = 9;
        assert!(matches!(
            snapshot.restore(&params).unwrap_err(),
            SimError::UnknownSynapseType(9)
        ));

        let mut snapshot = StoreSnapshot::capture(&store);
        snapshot.records[0].destination += 1;
        assert!(snapshot.restore(&params).is_err());

        let mut snapshot = StoreSnapshot::capture(&store);
        let dup = snapshot.records[0].clone();
        snapshot.records.push(dup);
        assert!(snapshot.restore(&params).is_err());
    }
}
