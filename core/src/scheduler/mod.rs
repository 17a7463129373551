//! Delayed callback scheduling
//!
//! The host owns the clock. The engine only needs to run a callback once
//! after a delay and to cancel it before it fires:
//!
//! ```text
//!   EffectHandler::activate(Some(5s))
//!          │  delay(5s, release)
//!          ▼
//!   ┌──────────────┐   cancel_delay(id)   ┌───────────────────────┐
//!   │  Scheduler   │◄──────────────────── │ EffectHandler::cancel │
//!   └──────┬───────┘                      └───────────────────────┘
//!          │ clock passes due time
//!          ▼
//!   release() → Effect::revoke
//! ```
//!
//! Callbacks run on the same thread that drives the clock.

mod tick;

use std::fmt;
use std::time::Duration;

use crate::effects::EffectError;

pub use tick::{TickReport, TickScheduler};

/// Handle to a pending delayed callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelayId(pub(crate) u64);

impl fmt::Display for DelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delay#{}", self.0)
    }
}

/// Single-shot callback run when a delay comes due
pub type DelayCallback = Box<dyn FnOnce() -> Result<(), EffectError>>;

/// Scheduled callback service supplied by the host.
pub trait Scheduler {
    /// Run `callback` once, `after` from now.
    fn delay(&self, after: Duration, callback: DelayCallback) -> DelayId;

    /// Drop a pending callback. Returns false if it already fired or was cancelled.
    fn cancel_delay(&self, id: DelayId) -> bool;
}
