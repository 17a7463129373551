//! Move-type priority resolution
//!
//! A player has a single move type, but noclip, freeze and fly can each be
//! held by any number of callers at once. The resolver is installed as both
//! the on- and off-behavior of all three effects and recomputes the move
//! type from scratch on every edge:
//!
//! ```text
//!   noclip active? ──yes──► Noclip
//!        │no
//!   freeze active? ──yes──► Freeze
//!        │no
//!   fly active?    ──yes──► Fly
//!        │no
//!        └────────────────► Walk
//! ```
//!
//! Releasing one hold never reverts the move type while another holder of
//! a movement effect remains.

use std::rc::{Rc, Weak};

use easyfx_types::MoveType;

use super::Effect;
use crate::entity::{HostError, PlayerEntity};

/// Owns the three movement effects and reconciles them into one move type.
#[derive(Debug)]
pub struct MoveTypeResolver<E: PlayerEntity> {
    noclip: Effect<E>,
    freeze: Effect<E>,
    fly: Effect<E>,
}

impl<E: PlayerEntity> MoveTypeResolver<E> {
    /// Build the movement effects wired to a new resolver.
    ///
    /// The effects reach the resolver through a weak reference: once the
    /// returned `Rc` is dropped, their behaviors do nothing.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|resolver: &Weak<Self>| Self {
            noclip: movement_effect("noclip", resolver),
            freeze: movement_effect("freeze", resolver),
            fly: movement_effect("fly", resolver),
        })
    }

    pub fn noclip(&self) -> &Effect<E> {
        &self.noclip
    }

    pub fn freeze(&self) -> &Effect<E> {
        &self.freeze
    }

    pub fn fly(&self) -> &Effect<E> {
        &self.fly
    }

    /// Movement effects in descending priority with the mode each one forces
    pub fn priorities(&self) -> [(&Effect<E>, MoveType); 3] {
        [
            (&self.noclip, MoveType::Noclip),
            (&self.freeze, MoveType::Freeze),
            (&self.fly, MoveType::Fly),
        ]
    }

    /// The move type the player should have right now
    pub fn resolve(&self, player: &E) -> MoveType {
        self.priorities()
            .into_iter()
            .find(|(effect, _)| effect.is_active(player))
            .map_or(MoveType::Walk, |(_, move_type)| move_type)
    }

    /// Write the resolved move type to the player
    pub fn refresh(&self, player: &E) -> Result<(), HostError> {
        let move_type = self.resolve(player);
        tracing::debug!(userid = player.userid(), %move_type, "Move type resolved");
        player.set_move_type(move_type)
    }
}

fn movement_effect<E: PlayerEntity>(name: &str, resolver: &Weak<MoveTypeResolver<E>>) -> Effect<E> {
    let on = Weak::clone(resolver);
    let off = Weak::clone(resolver);
    Effect::with_behaviors(
        name,
        move |player: &E| refresh(&on, player),
        move |player: &E| refresh(&off, player),
    )
}

fn refresh<E: PlayerEntity>(resolver: &Weak<MoveTypeResolver<E>>, player: &E) -> Result<(), HostError> {
    match resolver.upgrade() {
        Some(resolver) => resolver.refresh(player),
        None => Ok(()),
    }
}
