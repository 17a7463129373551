//! Reference-counted effect declarations
//!
//! An `Effect` declares what happens when a state turns on for a target and
//! what happens when it turns off. Every caller that wants the state holds
//! its own lease (an [`EffectHandler`]); the effect only runs its behaviors
//! on the first lease in and the last lease out for each target identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use super::{EffectError, EffectHandler, Transition};
use crate::entity::{HostError, Target};
use crate::scheduler::Scheduler;

/// On/off behavior of an effect
pub type Behavior<T> = Rc<dyn Fn(&T) -> Result<(), HostError>>;

struct EffectState<T: Target> {
    name: String,
    on: Option<Behavior<T>>,
    off: Option<Behavior<T>>,
    /// Live leases per target identity. A key is present iff its count > 0.
    leases: RefCell<HashMap<T::Key, Vec<EffectHandler<T>>>>,
}

/// Reference-counted on/off state for many targets.
///
/// Cloning an `Effect` shares its counters; use [`with_on`](Self::with_on)
/// and [`with_off`](Self::with_off) to derive a new, independent effect.
pub struct Effect<T: Target> {
    state: Rc<EffectState<T>>,
}

impl<T: Target> Clone for Effect<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Target> fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.state.name)
            .field(
                "active_targets",
                &self.state.leases.try_borrow().map(|l| l.len()).ok(),
            )
            .finish()
    }
}

impl<T: Target> Effect<T> {
    /// Effect with no behaviors. Counting still works.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), None, None)
    }

    pub fn with_behaviors<On, Off>(name: impl Into<String>, on: On, off: Off) -> Self
    where
        On: Fn(&T) -> Result<(), HostError> + 'static,
        Off: Fn(&T) -> Result<(), HostError> + 'static,
    {
        let on: Behavior<T> = Rc::new(on);
        let off: Behavior<T> = Rc::new(off);
        Self::from_parts(name.into(), Some(on), Some(off))
    }

    /// Derive an effect with a different on-behavior.
    ///
    /// The result starts with empty counters and shares nothing with `self`:
    /// leases held on `self` are not carried over. Meant for declaring
    /// effects, not for rebinding one that is in use.
    pub fn with_on<F>(&self, on: F) -> Self
    where
        F: Fn(&T) -> Result<(), HostError> + 'static,
    {
        let on: Behavior<T> = Rc::new(on);
        Self::from_parts(self.state.name.clone(), Some(on), self.state.off.clone())
    }

    /// Derive an effect with a different off-behavior. Same caveats as
    /// [`with_on`](Self::with_on).
    pub fn with_off<F>(&self, off: F) -> Self
    where
        F: Fn(&T) -> Result<(), HostError> + 'static,
    {
        let off: Behavior<T> = Rc::new(off);
        Self::from_parts(self.state.name.clone(), self.state.on.clone(), Some(off))
    }

    fn from_parts(name: String, on: Option<Behavior<T>>, off: Option<Behavior<T>>) -> Self {
        Self {
            state: Rc::new(EffectState {
                name,
                on,
                off,
                leases: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// True if both values are the same effect (shared counters)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Create a fresh, not yet active lease of this effect on `target`.
    pub fn handler_for(&self, target: &T, scheduler: Rc<dyn Scheduler>) -> EffectHandler<T> {
        EffectHandler::new(self.clone(), target.clone(), scheduler)
    }

    /// Whether any lease is currently held for the target's identity
    pub fn is_active(&self, target: &T) -> bool {
        self.active_count(target) > 0
    }

    /// Number of leases currently held for the target's identity
    pub fn active_count(&self, target: &T) -> usize {
        self.state
            .leases
            .borrow()
            .get(&target.identity())
            .map_or(0, Vec::len)
    }

    /// Snapshot of the leases currently held for the target's identity
    pub fn active_handlers(&self, target: &T) -> Vec<EffectHandler<T>> {
        self.state
            .leases
            .borrow()
            .get(&target.identity())
            .cloned()
            .unwrap_or_default()
    }

    /// Number of identities with at least one lease
    pub fn active_targets(&self) -> usize {
        self.state.leases.borrow().len()
    }

    /// Record `handler`'s lease. Runs the on-behavior on the 0 → 1 edge.
    ///
    /// The lease is counted before the behavior runs, so a failing behavior
    /// leaves the lease applied (and revocable).
    pub fn apply(&self, handler: &EffectHandler<T>) -> Result<(), EffectError> {
        self.check_owner(handler)?;
        let key = handler.target().identity();

        let count = {
            let mut leases = self.state.leases.borrow_mut();
            let held = leases.entry(key.clone()).or_default();
            if held.iter().any(|h| h.lease() == handler.lease()) {
                return Err(EffectError::AlreadyApplied {
                    effect: self.state.name.clone(),
                    lease: handler.lease(),
                });
            }
            held.push(handler.clone());
            held.len()
        };

        tracing::trace!(
            effect = %self.state.name,
            identity = ?key,
            lease = %handler.lease(),
            count,
            "Lease applied"
        );

        if count == 1 {
            tracing::debug!(effect = %self.state.name, identity = ?key, "Effect on");
            self.run(self.state.on.as_ref(), Transition::On, handler.target())?;
        }
        Ok(())
    }

    /// Drop `handler`'s lease. Runs the off-behavior on the 1 → 0 edge.
    pub fn revoke(&self, handler: &EffectHandler<T>) -> Result<(), EffectError> {
        self.check_owner(handler)?;
        let key = handler.target().identity();

        let (released, remaining) = {
            let mut leases = self.state.leases.borrow_mut();
            let Some(held) = leases.get_mut(&key) else {
                return Err(self.not_applied(handler, &key));
            };
            let Some(position) = held.iter().position(|h| h.lease() == handler.lease()) else {
                return Err(self.not_applied(handler, &key));
            };

            let released = held.remove(position);
            let remaining = held.len();
            if remaining == 0 {
                leases.remove(&key);
            }
            (released, remaining)
        };
        // The released clone may be the last strong reference to the lease
        drop(released);

        tracing::trace!(
            effect = %self.state.name,
            identity = ?key,
            lease = %handler.lease(),
            count = remaining,
            "Lease revoked"
        );

        if remaining == 0 {
            tracing::debug!(effect = %self.state.name, identity = ?key, "Effect off");
            self.run(self.state.off.as_ref(), Transition::Off, handler.target())?;
        }
        Ok(())
    }

    /// Cancel every lease held for the target's identity, pending timers
    /// included. Returns how many leases were released.
    ///
    /// Every lease is cancelled even if a behavior fails; the first failure
    /// is returned afterwards.
    pub fn cancel_all(&self, target: &T) -> Result<usize, EffectError> {
        cancel_each(self.active_handlers(target))
    }

    /// Cancel every lease held on any target. Same error handling as
    /// [`cancel_all`](Self::cancel_all).
    pub fn cancel_everywhere(&self) -> Result<usize, EffectError> {
        let handlers: Vec<EffectHandler<T>> = self
            .state
            .leases
            .borrow()
            .values()
            .flatten()
            .cloned()
            .collect();
        cancel_each(handlers)
    }

    fn check_owner(&self, handler: &EffectHandler<T>) -> Result<(), EffectError> {
        if self.ptr_eq(handler.effect()) {
            return Ok(());
        }
        Err(EffectError::ForeignHandler {
            effect: self.state.name.clone(),
            owner: handler.effect().name().to_string(),
            lease: handler.lease(),
        })
    }

    fn not_applied(&self, handler: &EffectHandler<T>, key: &T::Key) -> EffectError {
        tracing::warn!(
            effect = %self.state.name,
            identity = ?key,
            lease = %handler.lease(),
            "Revoke of a lease that is not applied"
        );
        EffectError::NotApplied {
            effect: self.state.name.clone(),
            lease: handler.lease(),
            target: format!("{key:?}"),
        }
    }

    fn run(
        &self,
        behavior: Option<&Behavior<T>>,
        transition: Transition,
        target: &T,
    ) -> Result<(), EffectError> {
        let Some(behavior) = behavior else {
            return Ok(());
        };
        behavior(target).map_err(|source| EffectError::Behavior {
            effect: self.state.name.clone(),
            transition,
            source,
        })
    }
}

fn cancel_each<T: Target>(handlers: Vec<EffectHandler<T>>) -> Result<usize, EffectError> {
    let mut released = 0;
    let mut first_error = None;

    for handler in handlers {
        match handler.cancel() {
            Ok(true) => released += 1,
            Ok(false) => {}
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(released),
    }
}
