//! Tests for Effect lease counting and EffectHandler lifecycle
//!
//! Verifies that:
//! - on/off behaviors only run on 0 → 1 and 1 → 0 edges
//! - auto-expiry and manual cancel release a lease exactly once
//! - misuse is rejected without corrupting the counters

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use super::{Effect, EffectError, EffectHandler, Transition};
use crate::entity::{HostError, Target};
use crate::scheduler::{Scheduler, TickScheduler};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct Dummy {
    id: u32,
}

impl Target for Dummy {
    type Key = u32;

    fn identity(&self) -> u32 {
        self.id
    }
}

fn dummy(id: u32) -> Dummy {
    Dummy { id }
}

/// Records every behavior invocation in order
#[derive(Default)]
struct Calls {
    log: RefCell<Vec<(Transition, u32)>>,
}

impl Calls {
    fn count(&self, transition: Transition) -> usize {
        self.log.borrow().iter().filter(|(t, _)| *t == transition).count()
    }

    fn ons(&self) -> usize {
        self.count(Transition::On)
    }

    fn offs(&self) -> usize {
        self.count(Transition::Off)
    }
}

fn counted_effect(name: &str) -> (Effect<Dummy>, Rc<Calls>) {
    let calls = Rc::new(Calls::default());
    let on = Rc::clone(&calls);
    let off = Rc::clone(&calls);
    let effect = Effect::with_behaviors(
        name,
        move |target: &Dummy| {
            on.log.borrow_mut().push((Transition::On, target.id));
            Ok(())
        },
        move |target: &Dummy| {
            off.log.borrow_mut().push((Transition::Off, target.id));
            Ok(())
        },
    );
    (effect, calls)
}

fn make_scheduler() -> Rc<TickScheduler> {
    Rc::new(TickScheduler::new())
}

fn lease(effect: &Effect<Dummy>, target: &Dummy, scheduler: &Rc<TickScheduler>) -> EffectHandler<Dummy> {
    let scheduler: Rc<dyn Scheduler> = scheduler.clone();
    effect.handler_for(target, scheduler)
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

// ═══════════════════════════════════════════════════════════════════════════
// Counting
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_first_activation_runs_on_once() {
    let (burn, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    lease(&burn, &target, &scheduler).activate(None).unwrap();
    lease(&burn, &target, &scheduler).activate(None).unwrap();
    lease(&burn, &target, &scheduler).activate(None).unwrap();

    assert_eq!(calls.ons(), 1);
    assert_eq!(calls.offs(), 0);
    assert_eq!(burn.active_count(&target), 3);
}

#[test]
fn test_two_burns_released_one_by_one() {
    let (burn, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let first = lease(&burn, &target, &scheduler).activate(None).unwrap();
    let second = lease(&burn, &target, &scheduler).activate(None).unwrap();
    assert_eq!(calls.ons(), 1);

    assert!(first.cancel().unwrap());
    assert!(burn.is_active(&target), "second lease still holds burn");
    assert!(first.is_active(), "handler reports the aggregate state");
    assert_eq!(calls.offs(), 0);

    assert!(second.cancel().unwrap());
    assert!(!burn.is_active(&target));
    assert_eq!(calls.offs(), 1);
}

#[test]
fn test_behaviors_alternate_for_any_release_order() {
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let (effect, calls) = counted_effect("freeze");
        let scheduler = make_scheduler();
        let target = dummy(9);

        for _round in 0..2 {
            let handlers: Vec<_> = (0..3)
                .map(|_| lease(&effect, &target, &scheduler).activate(None).unwrap())
                .collect();
            for &i in &order {
                handlers[i].cancel().unwrap();
            }
        }

        let log: Vec<_> = calls.log.borrow().iter().map(|(t, _)| *t).collect();
        assert_eq!(
            log,
            vec![Transition::On, Transition::Off, Transition::On, Transition::Off],
            "order {order:?}"
        );
    }
}

#[test]
fn test_is_active_tracks_net_leases() {
    let (effect, _calls) = counted_effect("godmode");
    let scheduler = make_scheduler();
    let target = dummy(3);

    assert!(!effect.is_active(&target));
    let a = lease(&effect, &target, &scheduler).activate(None).unwrap();
    let b = lease(&effect, &target, &scheduler).activate(None).unwrap();
    assert_eq!(effect.active_count(&target), 2);

    b.cancel().unwrap();
    assert_eq!(effect.active_count(&target), 1);
    assert!(effect.is_active(&target));

    a.cancel().unwrap();
    assert_eq!(effect.active_count(&target), 0);
    assert!(!effect.is_active(&target));
    assert_eq!(effect.active_targets(), 0, "empty keys are dropped");
}

#[test]
fn test_targets_are_counted_independently() {
    let (effect, calls) = counted_effect("noblock");
    let scheduler = make_scheduler();
    let (alice, bob) = (dummy(1), dummy(2));

    let on_alice = lease(&effect, &alice, &scheduler).activate(None).unwrap();
    lease(&effect, &bob, &scheduler).activate(None).unwrap();
    assert_eq!(effect.active_targets(), 2);

    on_alice.cancel().unwrap();
    assert!(!effect.is_active(&alice));
    assert!(effect.is_active(&bob));
    assert_eq!(*calls.log.borrow(), vec![
        (Transition::On, 1),
        (Transition::On, 2),
        (Transition::Off, 1),
    ]);
}

#[test]
fn test_distinct_handles_with_same_identity_share_count() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();

    let first = lease(&effect, &dummy(5), &scheduler).activate(None).unwrap();
    lease(&effect, &dummy(5), &scheduler).activate(None).unwrap();
    assert_eq!(calls.ons(), 1);

    first.cancel().unwrap();
    assert!(effect.is_active(&dummy(5)));
    assert_eq!(calls.offs(), 0);
}

#[test]
fn test_effect_without_behaviors_still_counts() {
    let effect: Effect<Dummy> = Effect::new("marker");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let handler = lease(&effect, &target, &scheduler).activate(None).unwrap();
    assert!(effect.is_active(&target));
    assert!(handler.cancel().unwrap());
    assert!(!effect.is_active(&target));
}

// ═══════════════════════════════════════════════════════════════════════════
// Expiry and Cancellation
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_expiry_releases_lease() {
    let (effect, calls) = counted_effect("noclip");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let handler = lease(&effect, &target, &scheduler)
        .activate(Some(secs(2)))
        .unwrap();
    assert!(handler.pending_delay().is_some());

    scheduler.advance(Duration::from_millis(1999));
    assert!(effect.is_active(&target));

    let report = scheduler.advance(Duration::from_millis(1));
    assert_eq!(report.fired, 1);
    assert!(report.failures.is_empty());
    assert!(!effect.is_active(&target));
    assert!(handler.pending_delay().is_none());
    assert_eq!(calls.offs(), 1);

    // Cancel after expiry is a no-op
    assert!(!handler.cancel().unwrap());
    assert_eq!(calls.offs(), 1);
}

#[test]
fn test_cancel_before_expiry_prevents_timer() {
    let (effect, calls) = counted_effect("freeze");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let timed = lease(&effect, &target, &scheduler)
        .activate(Some(secs(5)))
        .unwrap();
    scheduler.advance(secs(2));
    assert!(timed.cancel().unwrap());
    assert_eq!(scheduler.pending_count(), 0);

    // A second holder comes in after the cancel; the stale timer must not
    // release it when the original due time passes.
    let holder = lease(&effect, &target, &scheduler).activate(None).unwrap();
    let report = scheduler.advance(secs(10));
    assert_eq!(report.fired, 0);
    assert!(holder.is_applied());
    assert!(effect.is_active(&target));
    assert_eq!(calls.ons(), 2);
    assert_eq!(calls.offs(), 1);
}

#[test]
fn test_double_cancel_does_not_double_revoke() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let keeper = lease(&effect, &target, &scheduler).activate(None).unwrap();
    let twice = lease(&effect, &target, &scheduler).activate(None).unwrap();

    assert!(twice.cancel().unwrap());
    assert!(!twice.cancel().unwrap());
    assert_eq!(effect.active_count(&target), 1, "keeper's lease untouched");
    assert!(keeper.is_applied());
    assert_eq!(calls.offs(), 0);
}

#[test]
fn test_cancel_of_inactive_handler_is_noop() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();

    let handler = lease(&effect, &dummy(1), &scheduler);
    assert!(!handler.cancel().unwrap());
    assert_eq!(calls.log.borrow().len(), 0);
}

#[test]
fn test_zero_duration_means_indefinite() {
    let (effect, _calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let handler = lease(&effect, &target, &scheduler)
        .activate(Some(Duration::ZERO))
        .unwrap();
    assert!(handler.pending_delay().is_none());
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.advance(secs(3600));
    assert!(effect.is_active(&target));
}

#[test]
fn test_unbounded_duration_after_clock_moved() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);
    scheduler.advance(Duration::from_millis(15));

    let handler = lease(&effect, &target, &scheduler)
        .activate(Some(Duration::MAX))
        .unwrap();
    assert!(handler.pending_delay().is_some());

    scheduler.advance(secs(3600));
    assert!(effect.is_active(&target));

    assert!(handler.cancel().unwrap());
    assert_eq!(calls.offs(), 1);
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_dropped_handler_keeps_effect_until_cancel_all() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    lease(&effect, &target, &scheduler).activate(None).unwrap();
    lease(&effect, &target, &scheduler)
        .activate(Some(secs(30)))
        .unwrap();
    assert!(effect.is_active(&target));

    assert_eq!(effect.cancel_all(&target).unwrap(), 2);
    assert!(!effect.is_active(&target));
    assert_eq!(scheduler.pending_count(), 0, "timers cancelled too");
    assert_eq!(calls.offs(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Misuse
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reactivating_applied_handler_is_rejected() {
    let (effect, calls) = counted_effect("fly");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let handler = lease(&effect, &target, &scheduler).activate(None).unwrap();
    let err = handler.activate(Some(secs(1))).unwrap_err();
    assert!(matches!(err, EffectError::AlreadyApplied { .. }));
    assert_eq!(effect.active_count(&target), 1);
    assert_eq!(scheduler.pending_count(), 0, "rejected activation schedules nothing");

    assert!(handler.cancel().unwrap());
    assert_eq!(calls.offs(), 1);
}

#[test]
fn test_cancelled_handler_can_be_reactivated() {
    let (effect, calls) = counted_effect("fly");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let handler = lease(&effect, &target, &scheduler).activate(None).unwrap();
    handler.cancel().unwrap();
    handler.activate(Some(secs(1))).unwrap();
    assert!(effect.is_active(&target));

    scheduler.advance(secs(1));
    assert!(!effect.is_active(&target));
    assert_eq!(calls.ons(), 2);
    assert_eq!(calls.offs(), 2);
}

#[test]
fn test_revoke_of_untracked_lease_is_invalid_state() {
    let (effect, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);

    let other = lease(&effect, &target, &scheduler).activate(None).unwrap();
    let never_applied = lease(&effect, &target, &scheduler);

    let err = effect.revoke(&never_applied).unwrap_err();
    assert!(matches!(err, EffectError::NotApplied { .. }));
    assert!(other.is_applied());
    assert_eq!(effect.active_count(&target), 1);
    assert_eq!(calls.offs(), 0);
}

#[test]
fn test_handler_of_another_effect_is_rejected() {
    let (burn, _) = counted_effect("burn");
    let (freeze, _) = counted_effect("freeze");
    let scheduler = make_scheduler();

    let burn_lease = lease(&burn, &dummy(1), &scheduler);
    let err = freeze.apply(&burn_lease).unwrap_err();
    assert!(matches!(err, EffectError::ForeignHandler { .. }));
    assert!(!freeze.is_active(&dummy(1)));
}

// ═══════════════════════════════════════════════════════════════════════════
// Rebinding and Failures
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_rebinding_starts_with_fresh_counts() {
    let (original, calls) = counted_effect("burn");
    let scheduler = make_scheduler();
    let target = dummy(1);
    lease(&original, &target, &scheduler).activate(None).unwrap();

    let rebound_ons = Rc::new(Cell::new(0));
    let counter = Rc::clone(&rebound_ons);
    let rebound = original.with_on(move |_: &Dummy| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    assert!(!rebound.ptr_eq(&original));
    assert!(!rebound.is_active(&target), "no counts carried over");
    assert_eq!(rebound.name(), "burn");

    let handler = lease(&rebound, &target, &scheduler).activate(None).unwrap();
    assert_eq!(rebound_ons.get(), 1);
    assert_eq!(calls.ons(), 1, "original on-behavior not called again");
    assert_eq!(original.active_count(&target), 1);

    // The off-behavior was kept from the original declaration
    handler.cancel().unwrap();
    assert_eq!(calls.offs(), 1);
    assert!(original.is_active(&target));
}

#[test]
fn test_with_off_keeps_on_behavior() {
    let (original, calls) = counted_effect("godmode");
    let scheduler = make_scheduler();
    let offs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&offs);
    let rebound = original.with_off(move |_: &Dummy| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    let handler = lease(&rebound, &dummy(2), &scheduler).activate(None).unwrap();
    handler.cancel().unwrap();
    assert_eq!(calls.ons(), 1);
    assert_eq!(calls.offs(), 0);
    assert_eq!(offs.get(), 1);
}

#[test]
fn test_failing_on_behavior_keeps_counter_consistent() {
    let offs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&offs);
    let effect = Effect::with_behaviors(
        "fragile",
        |target: &Dummy| {
            Err(HostError::EntityGone {
                entity: target.id.to_string(),
            })
        },
        move |_: &Dummy| {
            counter.set(counter.get() + 1);
            Ok(())
        },
    );
    let scheduler = make_scheduler();
    let target = dummy(4);
    let handler = lease(&effect, &target, &scheduler);

    let err = handler.activate(None).unwrap_err();
    assert!(matches!(
        err,
        EffectError::Behavior {
            transition: Transition::On,
            ..
        }
    ));
    assert!(handler.is_applied(), "lease counted before the behavior ran");
    assert!(effect.is_active(&target));

    assert!(handler.cancel().unwrap());
    assert!(!effect.is_active(&target));
    assert_eq!(offs.get(), 1);
}

#[test]
fn test_failing_off_behavior_still_releases() {
    let effect = Effect::with_behaviors(
        "sticky",
        |_: &Dummy| Ok(()),
        |target: &Dummy| {
            Err(HostError::EntityGone {
                entity: target.id.to_string(),
            })
        },
    );
    let scheduler = make_scheduler();
    let target = dummy(4);
    let handler = lease(&effect, &target, &scheduler).activate(None).unwrap();

    let err = handler.cancel().unwrap_err();
    assert!(matches!(
        err,
        EffectError::Behavior {
            transition: Transition::Off,
            ..
        }
    ));
    assert!(!effect.is_active(&target));
    assert!(!handler.is_applied());
    assert!(!handler.cancel().unwrap(), "nothing left to release");
}

#[test]
fn test_failing_expiry_is_reported_by_scheduler() {
    let effect = Effect::with_behaviors(
        "sticky",
        |_: &Dummy| Ok(()),
        |target: &Dummy| {
            Err(HostError::EntityGone {
                entity: target.id.to_string(),
            })
        },
    );
    let scheduler = make_scheduler();
    let target = dummy(8);
    lease(&effect, &target, &scheduler)
        .activate(Some(secs(1)))
        .unwrap();

    let report = scheduler.advance(secs(1));
    assert_eq!(report.fired, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(!effect.is_active(&target));
}
