//! Built-in player effects
//!
//! Declares the standard set of player effects against any host
//! [`PlayerEntity`]. Each accessor hands out a fresh, inactive lease:
//!
//! ```ignore
//! let burn = effects.burn(&player).activate(None)?;
//! effects.noclip(&player).activate(Some(Duration::from_secs(2)))?;
//! // ...
//! burn.cancel()?;
//! ```

use std::rc::Rc;

use easyfx_types::{CollisionGroup, EffectKind, EffectSettings, FL_FROZEN, MoveType, TakeDamage};

use super::{Effect, EffectError, EffectHandler, MoveTypeResolver};
use crate::entity::PlayerEntity;
use crate::scheduler::Scheduler;

/// The standard player effects, sharing one scheduler.
pub struct PlayerEffects<E: PlayerEntity> {
    movement: Rc<MoveTypeResolver<E>>,
    paralyze: Effect<E>,
    burn: Effect<E>,
    godmode: Effect<E>,
    noblock: Effect<E>,
    scheduler: Rc<dyn Scheduler>,
}

impl<E: PlayerEntity> PlayerEffects<E> {
    pub fn new(scheduler: Rc<dyn Scheduler>, settings: &EffectSettings) -> Self {
        let burn_lifetime = settings.burn_lifetime_secs;

        Self {
            movement: MoveTypeResolver::new(),
            paralyze: Effect::with_behaviors(
                "paralyze",
                |player: &E| player.set_flags(player.flags()? | FL_FROZEN),
                |player: &E| player.set_flags(player.flags()? & !FL_FROZEN),
            ),
            burn: Effect::with_behaviors(
                "burn",
                move |player: &E| player.ignite_lifetime(burn_lifetime),
                |player: &E| player.ignite_lifetime(0.0),
            ),
            godmode: Effect::with_behaviors(
                "godmode",
                |player: &E| player.set_take_damage(TakeDamage::No),
                |player: &E| player.set_take_damage(TakeDamage::Yes),
            ),
            noblock: Effect::with_behaviors(
                "noblock",
                |player: &E| player.set_collision_group(CollisionGroup::DebrisTrigger),
                |player: &E| player.set_collision_group(CollisionGroup::Player),
            ),
            scheduler,
        }
    }

    pub fn effect(&self, kind: EffectKind) -> &Effect<E> {
        match kind {
            EffectKind::Noclip => self.movement.noclip(),
            EffectKind::Freeze => self.movement.freeze(),
            EffectKind::Fly => self.movement.fly(),
            EffectKind::Paralyze => &self.paralyze,
            EffectKind::Burn => &self.burn,
            EffectKind::Godmode => &self.godmode,
            EffectKind::Noblock => &self.noblock,
        }
    }

    /// New inactive lease of `kind` on `player`
    pub fn handler(&self, kind: EffectKind, player: &E) -> EffectHandler<E> {
        self.effect(kind)
            .handler_for(player, Rc::clone(&self.scheduler))
    }

    pub fn noclip(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Noclip, player)
    }

    pub fn freeze(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Freeze, player)
    }

    pub fn fly(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Fly, player)
    }

    pub fn paralyze(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Paralyze, player)
    }

    pub fn burn(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Burn, player)
    }

    pub fn godmode(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Godmode, player)
    }

    pub fn noblock(&self, player: &E) -> EffectHandler<E> {
        self.handler(EffectKind::Noblock, player)
    }

    pub fn movement(&self) -> &MoveTypeResolver<E> {
        &self.movement
    }

    /// Move type the player should have given the active movement effects
    pub fn move_type_of(&self, player: &E) -> MoveType {
        self.movement.resolve(player)
    }

    /// Kinds with at least one lease on the player, in declaration order
    pub fn active_kinds(&self, player: &E) -> Vec<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| self.effect(*kind).is_active(player))
            .collect()
    }

    /// Every live lease on the player, across all kinds
    pub fn active_handlers(&self, player: &E) -> Vec<EffectHandler<E>> {
        EffectKind::ALL
            .into_iter()
            .flat_map(|kind| self.effect(kind).active_handlers(player))
            .collect()
    }

    /// Cancel every lease of every kind on the player.
    ///
    /// All kinds are processed even if one fails; the first failure is
    /// returned afterwards.
    pub fn cancel_all(&self, player: &E) -> Result<usize, EffectError> {
        let mut released = 0;
        let mut first_error = None;

        for kind in EffectKind::ALL {
            match self.effect(kind).cancel_all(player) {
                Ok(count) => released += count,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        if released > 0 {
            tracing::debug!(userid = player.userid(), released, "Cancelled all effects");
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(released),
        }
    }
}

/// Releases every lease still held so the effects and their leases can be
/// freed; off-behaviors run as for a normal cancel.
impl<E: PlayerEntity> Drop for PlayerEffects<E> {
    fn drop(&mut self) {
        for kind in EffectKind::ALL {
            match self.effect(kind).cancel_everywhere() {
                Ok(0) => {}
                Ok(released) => tracing::debug!(effect = %kind, released, "Released leases on drop"),
                Err(err) => tracing::warn!(effect = %kind, error = %err, "Release on drop failed"),
            }
        }
    }
}
