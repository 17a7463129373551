//! Effect leases
//!
//! An `EffectHandler` is one caller's hold on an effect for one target.
//! It is created inactive; `activate` takes the lease, `cancel` (or the
//! auto-expiry timer) gives it back.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{Effect, EffectError};
use crate::entity::Target;
use crate::scheduler::{DelayId, Scheduler};

static NEXT_LEASE: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeaseId(u64);

impl LeaseId {
    fn next() -> Self {
        Self(NEXT_LEASE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for LeaseId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct LeaseState {
    /// Whether this lease is counted by the effect
    applied: bool,
    /// Auto-expiry timer, cleared once it fires or is cancelled
    pending: Option<DelayId>,
}

struct Lease<T: Target> {
    id: LeaseId,
    effect: Effect<T>,
    target: T,
    scheduler: Rc<dyn Scheduler>,
    state: RefCell<LeaseState>,
}

/// One lease of an [`Effect`] on one target.
///
/// Clones refer to the same lease. While applied, the effect keeps the
/// lease alive, so dropping every handle does not end the effect; only
/// `cancel` or the expiry timer does. An applied lease and its effect
/// reference each other: a standalone [`Effect`] dropped with leases still
/// held leaks them unless they are cancelled first
/// ([`Effect::cancel_everywhere`]). `PlayerEffects` does this on drop.
pub struct EffectHandler<T: Target> {
    inner: Rc<Lease<T>>,
}

impl<T: Target> Clone for EffectHandler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Target> PartialEq for EffectHandler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T: Target> Eq for EffectHandler<T> {}

impl<T: Target> fmt::Debug for EffectHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.try_borrow();
        f.debug_struct("EffectHandler")
            .field("lease", &self.inner.id)
            .field("effect", &self.inner.effect.name())
            .field("target", &self.inner.target.identity())
            .field("applied", &state.as_ref().map(|s| s.applied).ok())
            .field("pending", &state.as_ref().ok().and_then(|s| s.pending))
            .finish()
    }
}

impl<T: Target> EffectHandler<T> {
    pub(crate) fn new(effect: Effect<T>, target: T, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(Lease {
                id: LeaseId::next(),
                effect,
                target,
                scheduler,
                state: RefCell::new(LeaseState::default()),
            }),
        }
    }

    pub fn lease(&self) -> LeaseId {
        self.inner.id
    }

    pub fn effect(&self) -> &Effect<T> {
        &self.inner.effect
    }

    pub fn target(&self) -> &T {
        &self.inner.target
    }

    /// Whether the effect is in force for the target, from any lease.
    ///
    /// This is the aggregate state: it stays true after this lease is
    /// cancelled if another lease still holds the effect.
    pub fn is_active(&self) -> bool {
        self.inner.effect.is_active(&self.inner.target)
    }

    /// Whether this particular lease is currently counted
    pub fn is_applied(&self) -> bool {
        self.inner.state.borrow().applied
    }

    /// The auto-expiry timer, if one is still pending
    pub fn pending_delay(&self) -> Option<DelayId> {
        self.inner.state.borrow().pending
    }

    /// Take the lease. With a non-zero `duration`, the lease is given back
    /// automatically once it elapses.
    ///
    /// Returns the handler itself so it can be kept for a later `cancel`.
    /// Fails with [`EffectError::AlreadyApplied`] if the lease is already
    /// held; a cancelled handler may be activated again.
    pub fn activate(&self, duration: Option<Duration>) -> Result<Self, EffectError> {
        if self.is_applied() {
            return Err(EffectError::AlreadyApplied {
                effect: self.inner.effect.name().to_string(),
                lease: self.inner.id,
            });
        }

        if let Some(duration) = duration.filter(|d| !d.is_zero()) {
            let id = self.schedule_expiry(duration);
            self.inner.state.borrow_mut().pending = Some(id);
        }
        self.inner.state.borrow_mut().applied = true;

        match self.inner.effect.apply(self) {
            Ok(()) => Ok(self.clone()),
            // Counted before the behavior ran: the lease stays held
            Err(err @ EffectError::Behavior { .. }) => Err(err),
            Err(err) => {
                self.inner.state.borrow_mut().applied = false;
                self.cancel_timer();
                Err(err)
            }
        }
    }

    /// Give the lease back. Cancels the expiry timer if it hasn't fired.
    ///
    /// Returns `Ok(true)` if the lease was released by this call and
    /// `Ok(false)` if it was not held (never activated, already cancelled,
    /// or already expired).
    pub fn cancel(&self) -> Result<bool, EffectError> {
        self.cancel_timer();
        self.release()
    }

    fn schedule_expiry(&self, duration: Duration) -> DelayId {
        let lease = Rc::downgrade(&self.inner);
        let id = self
            .inner
            .scheduler
            .delay(duration, Box::new(move || expire(&lease)));

        tracing::debug!(
            effect = %self.inner.effect.name(),
            identity = ?self.inner.target.identity(),
            lease = %self.inner.id,
            delay = %id,
            ?duration,
            "Lease expiry scheduled"
        );
        id
    }

    fn cancel_timer(&self) {
        let pending = self.inner.state.borrow_mut().pending.take();
        if let Some(id) = pending {
            self.inner.scheduler.cancel_delay(id);
        }
    }

    /// Revoke exactly once per activation. The flag is cleared before the
    /// effect runs any behavior.
    fn release(&self) -> Result<bool, EffectError> {
        let was_applied = std::mem::take(&mut self.inner.state.borrow_mut().applied);
        if !was_applied {
            return Ok(false);
        }
        self.inner.effect.revoke(self)?;
        Ok(true)
    }
}

/// Expiry callback. Holds the lease weakly so a pending timer never keeps
/// a released lease alive.
fn expire<T: Target>(lease: &Weak<Lease<T>>) -> Result<(), EffectError> {
    let Some(inner) = lease.upgrade() else {
        return Ok(());
    };
    let handler = EffectHandler { inner };
    handler.inner.state.borrow_mut().pending = None;

    tracing::debug!(
        effect = %handler.inner.effect.name(),
        identity = ?handler.inner.target.identity(),
        lease = %handler.inner.id,
        "Lease expired"
    );
    handler.release().map(|_| ())
}
