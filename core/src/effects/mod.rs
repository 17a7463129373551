//! Reference-counted player effects
//!
//! This module provides:
//! - **Effect**: declaration of an on/off state with a lease count per target
//! - **EffectHandler**: one caller's lease, with optional auto-expiry
//! - **MoveTypeResolver**: reconciles noclip/freeze/fly into one move type
//! - **PlayerEffects**: the built-in effect set for player entities
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Effect (declared once)                       │
//! │   on: ignite(3600)   off: ignite(0)   leases: {userid → [..]}   │
//! └─────────────────────────────────────────────────────────────────┘
//!            │ handler_for(player)                ▲ apply / revoke
//!            ▼                                    │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │             EffectHandler (one lease per caller)                │
//! │   activate(Some(5s)) ──► Scheduler ──► expiry ──► revoke        │
//! │   cancel()           ──► cancel_delay + revoke                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The on-behavior runs when a target's count goes 0 → 1 and the
//! off-behavior when it goes 1 → 0. Counts in between are silent.

mod effect;
mod error;
mod handler;
mod player;
mod resolver;

#[cfg(test)]
mod effect_tests;

pub use effect::{Behavior, Effect};
pub use error::{EffectError, Transition};
pub use handler::{EffectHandler, LeaseId};
pub use player::PlayerEffects;
pub use resolver::MoveTypeResolver;
