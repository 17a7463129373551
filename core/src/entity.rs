//! Host entity traits
//!
//! Entities are owned by the game host. The engine only sees cheap handles
//! that can be cloned into delayed callbacks and identified by a stable key.

use std::fmt::Debug;
use std::hash::Hash;

use easyfx_types::{CollisionGroup, MoveType, TakeDamage};
use thiserror::Error;

/// Server-assigned user id, stable for the lifetime of a connection.
pub type UserId = i32;

/// Anything an effect can act upon.
pub trait Target: Clone + 'static {
    /// Stable identity used to aggregate leases across handle instances
    type Key: Eq + Hash + Clone + Debug;

    /// Must return the same key for every handle to the same entity.
    fn identity(&self) -> Self::Key;
}

/// Errors reported by the host when touching an entity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("entity {entity} is no longer valid")]
    EntityGone { entity: String },

    #[error("entity {entity} has no property '{name}'")]
    UnknownProperty { entity: String, name: String },
}

/// Player entity as exposed by the host.
///
/// Writes take `&self`: handles are shared and the host owns the state.
pub trait PlayerEntity: Target<Key = UserId> {
    fn userid(&self) -> UserId {
        self.identity()
    }

    fn move_type(&self) -> Result<MoveType, HostError>;
    fn set_move_type(&self, move_type: MoveType) -> Result<(), HostError>;

    fn flags(&self) -> Result<u32, HostError>;
    fn set_flags(&self, flags: u32) -> Result<(), HostError>;

    /// Set the player on fire for `secs` seconds; zero extinguishes.
    fn ignite_lifetime(&self, secs: f32) -> Result<(), HostError>;

    fn set_take_damage(&self, mode: TakeDamage) -> Result<(), HostError>;
    fn set_collision_group(&self, group: CollisionGroup) -> Result<(), HostError>;

    /// Read a named numeric property (gravity, speed, ...)
    fn property(&self, name: &str) -> Result<f32, HostError>;
    fn set_property(&self, name: &str, value: f32) -> Result<(), HostError>;
}
