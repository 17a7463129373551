use std::cell::RefCell;
use std::rc::Rc;

use super::handler::SignalHandler;
use super::signal::PlayerSignal;
use crate::effects::{EffectError, PlayerEffects};
use crate::entity::{PlayerEntity, UserId};
use crate::players::PlayerRegistry;

/// Ends player effects when the host says the player or level is going away.
///
/// | Signal            | Action                                        |
/// |-------------------|-----------------------------------------------|
/// | `PlayerDeath`     | reset gravity, cancel all effects             |
/// | `PlayerDisconnect`| cancel all effects, drop the cached player    |
/// | `LevelShutdown`   | cancel everything, clear the player cache     |
pub struct EffectCleanup<E: PlayerEntity> {
    effects: Rc<PlayerEffects<E>>,
    players: Rc<RefCell<PlayerRegistry<E>>>,
    default_gravity: f32,
}

impl<E: PlayerEntity> EffectCleanup<E> {
    pub fn new(
        effects: Rc<PlayerEffects<E>>,
        players: Rc<RefCell<PlayerRegistry<E>>>,
        default_gravity: f32,
    ) -> Self {
        Self {
            effects,
            players,
            default_gravity,
        }
    }

    /// Cloned out so no registry borrow is held while behaviors run
    fn cached(&self, userid: UserId) -> Option<E> {
        self.players.borrow().get(userid).cloned()
    }

    fn on_death(&self, userid: UserId) -> Result<(), EffectError> {
        let Some(player) = self.cached(userid) else {
            return Ok(());
        };
        // Cancel even if the gravity write fails
        let gravity = player.set_property("gravity", self.default_gravity);
        self.effects.cancel_all(&player)?;
        gravity?;
        Ok(())
    }

    fn on_disconnect(&self, userid: UserId) -> Result<(), EffectError> {
        let Some(player) = self.cached(userid) else {
            return Ok(());
        };
        let cancelled = self.effects.cancel_all(&player);
        self.players.borrow_mut().discard(userid);
        cancelled.map(|_| ())
    }

    fn on_level_shutdown(&self) -> Result<(), EffectError> {
        let players: Vec<E> = self.players.borrow().iter().cloned().collect();

        let mut first_error = None;
        for player in &players {
            if let Err(err) = self.effects.cancel_all(player) {
                first_error.get_or_insert(err);
            }
        }
        self.players.borrow_mut().discard_all();

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<E: PlayerEntity> SignalHandler for EffectCleanup<E> {
    fn handle_signal(&mut self, signal: &PlayerSignal) -> Result<(), EffectError> {
        match *signal {
            PlayerSignal::PlayerDeath { userid } => self.on_death(userid),
            PlayerSignal::PlayerDisconnect { userid } => self.on_disconnect(userid),
            PlayerSignal::LevelShutdown => self.on_level_shutdown(),
        }
    }

    fn name(&self) -> &str {
        "effect_cleanup"
    }
}
