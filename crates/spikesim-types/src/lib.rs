// Copyright 2026 spikesim contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikesim Core Types
//!
//! Shared types for the spikesim simulation core.
//!
//! ## Design Philosophy
//! - **Type-safe**: Strong types instead of raw primitives
//! - **POD-friendly**: Everything that crosses the backend boundary has a
//!   stable raw encoding (`u8` type codes, `u32` ids)
//! - **Cheap**: All id/enum types are `Copy` and fit in a register

use std::fmt;

pub mod params;

pub use params::{SimulationParameters, SynapseClassConstants};

/// Neuron ID (index into the simulation's neuron collection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NeuronId(pub u32);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Global synapse index: the stable identifier for an occupied slot.
///
/// The synapse arena is destination-major, so a global index decomposes as
/// `destination * max_synapses_per_neuron + local_slot`. All external
/// references to a synapse go through this id, never through raw offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SynapseId(pub u32);

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synapse({})", self.0)
    }
}

/// Handle of a destination-side summation point.
///
/// Indexes into the neuron collaborator's summation buffer. Each destination
/// neuron owns exactly one summation point; every synapse terminating at that
/// neuron carries the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SummationHandle(pub u32);

/// Electrophysiological class of a neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NeuronType {
    Excitatory,
    Inhibitory,
}

/// Synapse type, determined by the classes of its endpoints.
///
/// The source class fixes the sign of the postsynaptic contribution; the
/// full pair selects the decay time constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SynapseType {
    /// Inhibitory source, inhibitory destination
    InhToInh,
    /// Inhibitory source, excitatory destination
    InhToExc,
    /// Excitatory source, inhibitory destination
    ExcToInh,
    /// Excitatory source, excitatory destination
    ExcToExc,
}

impl SynapseType {
    /// Classify the synapse connecting two neurons by their types.
    #[inline(always)]
    pub fn between(source: NeuronType, destination: NeuronType) -> Self {
        match (source, destination) {
            (NeuronType::Inhibitory, NeuronType::Inhibitory) => SynapseType::InhToInh,
            (NeuronType::Inhibitory, NeuronType::Excitatory) => SynapseType::InhToExc,
            (NeuronType::Excitatory, NeuronType::Inhibitory) => SynapseType::ExcToInh,
            (NeuronType::Excitatory, NeuronType::Excitatory) => SynapseType::ExcToExc,
        }
    }

    /// Sign of this type's postsynaptic contribution.
    ///
    /// Excitatory-sourced types contribute positively, inhibitory-sourced
    /// types negatively. Unknown types are unrepresentable here; raw codes
    /// are rejected at the [`TryFrom<u8>`] decode boundary instead.
    #[inline(always)]
    pub fn sign(self) -> f32 {
        match self {
            SynapseType::InhToInh | SynapseType::InhToExc => -1.0,
            SynapseType::ExcToInh | SynapseType::ExcToExc => 1.0,
        }
    }

    /// Stable raw encoding used in backend buffers and snapshots.
    #[inline(always)]
    pub fn code(self) -> u8 {
        match self {
            SynapseType::InhToInh => 0,
            SynapseType::InhToExc => 1,
            SynapseType::ExcToInh => 2,
            SynapseType::ExcToExc => 3,
        }
    }
}

impl TryFrom<u8> for SynapseType {
    type Error = SimError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SynapseType::InhToInh),
            1 => Ok(SynapseType::InhToExc),
            2 => Ok(SynapseType::ExcToInh),
            3 => Ok(SynapseType::ExcToExc),
            other => Err(SimError::UnknownSynapseType(other)),
        }
    }
}

impl fmt::Display for SynapseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SynapseType::InhToInh => "II",
            SynapseType::InhToExc => "IE",
            SynapseType::ExcToInh => "EI",
            SynapseType::ExcToExc => "EE",
        };
        write!(f, "{}", s)
    }
}

/// Error types for simulation operations
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration error: a parameter failed validation. Fatal before setup.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Configuration error: a raw synapse type code did not decode.
    #[error("unrecognized synapse type code: {0}")]
    UnknownSynapseType(u8),

    /// Recoverable: the destination neuron has no free synapse slot.
    /// The requested synapse is simply not created.
    #[error("neuron {neuron} is at its synapse capacity ({limit})")]
    CapacityExceeded { neuron: NeuronId, limit: usize },

    #[error("synapse {0} addresses an unoccupied slot")]
    VacantSynapse(SynapseId),

    #[error("synapse index {index} out of range for arena of {capacity} slots")]
    SynapseOutOfRange { index: u32, capacity: usize },

    #[error("neuron index {index} out of range for population of {count}")]
    NeuronOutOfRange { index: u32, count: usize },

    /// Internal invariant failure: the index map was read after a topology
    /// change without a rebuild.
    #[error("synapse index map is stale; rebuild required before iteration")]
    StaleIndexMap,

    /// Internal invariant failure: the index map disagrees with the store's
    /// occupancy set.
    #[error("index map inconsistent with store: {0}")]
    IndexMapInconsistent(String),

    /// Internal invariant failure: device mirror no longer matches the host
    /// store structurally.
    #[error("device mirror diverged from host store: {0}")]
    MirrorDiverged(String),

    #[error("snapshot rejected: {0}")]
    SnapshotMismatch(String),
}

impl SimError {
    /// Whether the simulation may continue after reporting this error.
    ///
    /// Capacity misses are reported and skipped; everything else either
    /// aborts setup (configuration) or aborts the run (invariant failures).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimError::CapacityExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_positive_for_excitatory_sources() {
        assert_eq!(SynapseType::ExcToExc.sign(), 1.0);
        assert_eq!(SynapseType::ExcToInh.sign(), 1.0);
    }

    #[test]
    fn sign_negative_for_inhibitory_sources() {
        assert_eq!(SynapseType::InhToInh.sign(), -1.0);
        assert_eq!(SynapseType::InhToExc.sign(), -1.0);
    }

    #[test]
    fn type_codes_round_trip() {
        for ty in [
            SynapseType::InhToInh,
            SynapseType::InhToExc,
            SynapseType::ExcToInh,
            SynapseType::ExcToExc,
        ] {
            assert_eq!(SynapseType::try_from(ty.code()).unwrap(), ty);
        }
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        let err = SynapseType::try_from(7).unwrap_err();
        assert!(matches!(err, SimError::UnknownSynapseType(7)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn between_matches_endpoint_classes() {
        assert_eq!(
            SynapseType::between(NeuronType::Excitatory, NeuronType::Inhibitory),
            SynapseType::ExcToInh
        );
        assert_eq!(
            SynapseType::between(NeuronType::Inhibitory, NeuronType::Excitatory),
            SynapseType::InhToExc
        );
    }

    #[test]
    fn capacity_error_is_recoverable() {
        let err = SimError::CapacityExceeded {
            neuron: NeuronId(3),
            limit: 16,
        };
        assert!(err.is_recoverable());
    }
}
