// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-backend equivalence: given identical configuration and inputs,
//! host and parallel runs produce the same summation-point trajectories
//! and the same synapse state, including across mid-run topology edits.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spikesim_engine::{BackendKind, NeuronBuffers, SynapseEngine};
use spikesim_layout::{Layout, LayoutConfig};
use spikesim_types::{NeuronId, SimulationParameters, SummationHandle, SynapseType};

const NEURONS: usize = 60;

fn params() -> SimulationParameters {
    let mut p = SimulationParameters::new(NEURONS, 6);
    p.synapse_constants.w_exc = 0.75;
    p.synapse_constants.w_inh = 1.25;
    p
}

fn edges(seed: u64) -> Vec<(SynapseType, u32, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let layout = Layout::generate(NEURONS, &LayoutConfig::default(), &mut rng).unwrap();

    let mut edges = Vec::new();
    for dst in 0..NEURONS {
        for _ in 0..4 {
            let src = rng.gen_range(0..NEURONS);
            if src != dst {
                edges.push((layout.synapse_type(src, dst), src as u32, dst as u32));
            }
        }
    }
    edges
}

fn apply_edges(engine: &mut SynapseEngine, edges: &[(SynapseType, u32, u32)]) {
    for &(ty, src, dst) in edges {
        engine
            .add_synapse(ty, NeuronId(src), NeuronId(dst), SummationHandle(dst))
            .unwrap();
    }
}

fn fire_pattern(step: u64, neurons: &mut NeuronBuffers) {
    for i in 0..NEURONS {
        neurons.set_fired(i, (i as u64 * 3 + step) % 7 == 0);
    }
}

#[test]
fn host_and_parallel_trajectories_match() {
    let edges = edges(99);
    let mut host = SynapseEngine::new(params(), BackendKind::Host).unwrap();
    let mut parallel = SynapseEngine::new(params(), BackendKind::Parallel).unwrap();
    apply_edges(&mut host, &edges);
    apply_edges(&mut parallel, &edges);

    let mut host_neurons = NeuronBuffers::new(NEURONS);
    let mut par_neurons = NeuronBuffers::new(NEURONS);

    for step in 0..50 {
        fire_pattern(step, &mut host_neurons);
        fire_pattern(step, &mut par_neurons);
        host.step(&mut host_neurons).unwrap();
        parallel.step(&mut par_neurons).unwrap();
        assert_eq!(
            host_neurons.summation_points, par_neurons.summation_points,
            "summation trajectories diverged at step {}",
            step
        );
    }

    let host_snapshot = host.snapshot().unwrap();
    let par_snapshot = parallel.snapshot().unwrap();
    assert_eq!(host_snapshot, par_snapshot);
}

#[test]
fn equivalence_survives_mid_run_topology_edits() {
    let edges = edges(5);
    let mut host = SynapseEngine::new(params(), BackendKind::Host).unwrap();
    let mut parallel = SynapseEngine::new(params(), BackendKind::Parallel).unwrap();
    apply_edges(&mut host, &edges);
    apply_edges(&mut parallel, &edges);

    let mut host_neurons = NeuronBuffers::new(NEURONS);
    let mut par_neurons = NeuronBuffers::new(NEURONS);

    for step in 0..30u64 {
        fire_pattern(step, &mut host_neurons);
        fire_pattern(step, &mut par_neurons);
        host.step(&mut host_neurons).unwrap();
        parallel.step(&mut par_neurons).unwrap();

        // halfway through, grow one synapse and prune another on both
        if step == 14 {
            for engine in [&mut host, &mut parallel] {
                engine
                    .add_synapse(
                        SynapseType::ExcToExc,
                        NeuronId(1),
                        NeuronId(2),
                        SummationHandle(2),
                    )
                    .unwrap();
                let victim = engine.store().occupied_ids().next().unwrap();
                let neuron = NeuronId(engine.store().slot_of(victim).0 as u32);
                engine.erase_synapse(neuron, victim).unwrap();
            }
        }

        assert_eq!(host_neurons.summation_points, par_neurons.summation_points);
    }

    let host_snapshot = host.snapshot().unwrap();
    let par_snapshot = parallel.snapshot().unwrap();
    assert_eq!(host_snapshot, par_snapshot);
}
