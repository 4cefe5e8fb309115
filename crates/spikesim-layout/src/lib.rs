// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Layout Generation
//!
//! Assigns an electrophysiological class (excitatory / inhibitory) and a
//! starter flag (endogenously active) to every neuron slot before any
//! synapses exist. The synapse creation policy consumes the result: the
//! classes of a synapse's endpoints determine its type, sign and decay
//! constant.
//!
//! Randomized layouts draw from a caller-supplied RNG handle so that a run
//! is fully reproducible from its seed; nothing in this crate touches a
//! process-wide generator.

use rand::Rng;
use spikesim_types::{NeuronType, Result, SimError, SynapseType};
use tracing::debug;

/// Layout configuration.
///
/// Fixed index lists override the corresponding random selection, mirroring
/// the usual configuration precedence: an explicit layout wins over
/// fraction-driven randomness.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutConfig {
    /// Fraction of the population that is excitatory (random layouts)
    pub frac_excitatory: f32,

    /// Fraction of the population flagged as starter neurons (random layouts)
    pub frac_starter: f32,

    /// Explicit inhibitory neuron indices; overrides `frac_excitatory`
    pub fixed_inhibitory: Option<Vec<u32>>,

    /// Explicit starter neuron indices; overrides `frac_starter`
    pub fixed_starters: Option<Vec<u32>>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            frac_excitatory: 0.98,
            frac_starter: 0.10,
            fixed_inhibitory: None,
            fixed_starters: None,
        }
    }
}

impl LayoutConfig {
    /// Validate against a population size, collecting every violation.
    pub fn validate(&self, neuron_count: usize) -> std::result::Result<(), Vec<SimError>> {
        let mut errors = Vec::new();

        for (name, frac) in [
            ("frac_excitatory", self.frac_excitatory),
            ("frac_starter", self.frac_starter),
        ] {
            if !(frac.is_finite() && (0.0..=1.0).contains(&frac)) {
                errors.push(SimError::InvalidParameter {
                    name,
                    value: frac.to_string(),
                    reason: "fraction must lie in [0, 1]".into(),
                });
            }
        }

        for (name, list) in [
            ("fixed_inhibitory", &self.fixed_inhibitory),
            ("fixed_starters", &self.fixed_starters),
        ] {
            if let Some(indices) = list {
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= neuron_count) {
                    errors.push(SimError::InvalidParameter {
                        name,
                        value: bad.to_string(),
                        reason: format!("index exceeds population of {}", neuron_count),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Generated layout: one class and one starter flag per neuron slot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layout {
    pub neuron_types: Vec<NeuronType>,
    pub starter_flags: Vec<bool>,
}

impl Layout {
    /// Generate a layout for `neuron_count` neurons.
    ///
    /// The RNG is consumed in a fixed call order (type map first, starter
    /// map second), so identical seeds yield identical layouts.
    pub fn generate<R: Rng>(
        neuron_count: usize,
        config: &LayoutConfig,
        rng: &mut R,
    ) -> Result<Layout> {
        let neuron_types = generate_neuron_types(neuron_count, config, rng);

        let num_excitatory = neuron_types
            .iter()
            .filter(|&&t| t == NeuronType::Excitatory)
            .count();
        debug!(
            neuron_count,
            num_excitatory,
            num_inhibitory = neuron_count - num_excitatory,
            "neuron type map generated"
        );

        let starter_flags = generate_starter_flags(&neuron_types, config, rng)?;
        debug!(
            num_starters = starter_flags.iter().filter(|&&s| s).count(),
            "starter map generated"
        );

        Ok(Layout {
            neuron_types,
            starter_flags,
        })
    }

    /// Type of a synapse connecting two neurons of this layout.
    #[inline]
    pub fn synapse_type(&self, source: usize, destination: usize) -> SynapseType {
        SynapseType::between(self.neuron_types[source], self.neuron_types[destination])
    }

    pub fn neuron_count(&self) -> usize {
        self.neuron_types.len()
    }

    pub fn is_starter(&self, neuron: usize) -> bool {
        self.starter_flags[neuron]
    }
}

/// Round-half-up share of a population, as configuration fractions are
/// conventionally interpreted.
#[inline]
fn fraction_of(count: usize, frac: f32) -> usize {
    (frac * count as f32 + 0.5) as usize
}

fn generate_neuron_types<R: Rng>(
    neuron_count: usize,
    config: &LayoutConfig,
    rng: &mut R,
) -> Vec<NeuronType> {
    let mut types = vec![NeuronType::Excitatory; neuron_count];

    if let Some(fixed) = &config.fixed_inhibitory {
        for &i in fixed {
            types[i as usize] = NeuronType::Inhibitory;
        }
        return types;
    }

    let num_excitatory = fraction_of(neuron_count, config.frac_excitatory);
    let num_inhibitory = neuron_count - num_excitatory;

    // Single-pass random selection of the inhibitory subset: seed the pool
    // with indices 0..k, then give each later index a chance to displace a
    // pooled one. Known not to weight all C(n, k) subsets equally; retained
    // because downstream activity statistics are calibrated against it.
    let mut pool: Vec<usize> = (0..num_inhibitory).collect();
    for i in num_inhibitory..neuron_count {
        let j = (rng.gen::<f32>() * neuron_count as f32) as usize;
        if j < num_inhibitory {
            pool[j] = i;
        }
    }
    for &i in &pool {
        types[i] = NeuronType::Inhibitory;
    }

    types
}

fn generate_starter_flags<R: Rng>(
    neuron_types: &[NeuronType],
    config: &LayoutConfig,
    rng: &mut R,
) -> Result<Vec<bool>> {
    let neuron_count = neuron_types.len();
    let mut starters = vec![false; neuron_count];

    if let Some(fixed) = &config.fixed_starters {
        for &i in fixed {
            starters[i as usize] = true;
        }
        return Ok(starters);
    }

    let num_starters = fraction_of(neuron_count, config.frac_starter);
    let num_excitatory = neuron_types
        .iter()
        .filter(|&&t| t == NeuronType::Excitatory)
        .count();

    // Rejection sampling below cannot terminate without enough candidates.
    if num_starters > num_excitatory {
        return Err(SimError::InvalidParameter {
            name: "frac_starter",
            value: config.frac_starter.to_string(),
            reason: format!(
                "requests {} starters but only {} excitatory neurons exist",
                num_starters, num_excitatory
            ),
        });
    }

    // Starters are drawn from the excitatory population only.
    let mut allocated = 0;
    while allocated < num_starters {
        let i = rng.gen_range(0..neuron_count);
        if neuron_types[i] == NeuronType::Excitatory && !starters[i] {
            starters[i] = true;
            allocated += 1;
        }
    }

    Ok(starters)
}
