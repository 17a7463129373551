//! Error types for effect operations

use std::fmt;

use thiserror::Error;

use super::LeaseId;
use crate::entity::HostError;

/// Which edge of the activation count a behavior was run for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 0 → 1
    On,
    /// 1 → 0
    Off,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::On => f.write_str("on"),
            Transition::Off => f.write_str("off"),
        }
    }
}

/// Errors raised while applying or revoking effects
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("lease {lease} is already applied to effect '{effect}'")]
    AlreadyApplied { effect: String, lease: LeaseId },

    /// Revoke of a lease the effect isn't tracking (double revoke)
    #[error("effect '{effect}' has no active lease {lease} for target {target}")]
    NotApplied {
        effect: String,
        lease: LeaseId,
        target: String,
    },

    #[error("lease {lease} belongs to effect '{owner}', not '{effect}'")]
    ForeignHandler {
        effect: String,
        owner: String,
        lease: LeaseId,
    },

    /// The counter already reflects the transition when this surfaces
    #[error("'{effect}' {transition} behavior failed")]
    Behavior {
        effect: String,
        transition: Transition,
        #[source]
        source: HostError,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}
