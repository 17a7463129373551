use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use easyfx_core::context::AppConfig;
use easyfx_core::effects::{EffectHandler, LeaseId, PlayerEffects};
use easyfx_core::players::PlayerRegistry;
use easyfx_core::scheduler::{Scheduler, TickReport, TickScheduler};
use easyfx_core::signal_processor::{EffectCleanup, SignalDispatcher};
use easyfx_core::{SimPlayer, UserId};

/// Holds all state for the simulator session.
/// This is a lightweight container - logic lives in the core types.
pub struct CliContext {
    pub config: AppConfig,
    pub scheduler: Rc<TickScheduler>,
    pub effects: Rc<PlayerEffects<SimPlayer>>,
    pub players: Rc<RefCell<PlayerRegistry<SimPlayer>>>,
    pub dispatcher: SignalDispatcher,
    /// Leases taken from the prompt, so they can be cancelled by id
    leases: BTreeMap<LeaseId, EffectHandler<SimPlayer>>,
}

impl CliContext {
    pub fn new(config: AppConfig) -> Self {
        let scheduler = Rc::new(TickScheduler::new());
        let shared: Rc<dyn Scheduler> = scheduler.clone();
        let effects = Rc::new(PlayerEffects::new(shared, &config.effects));
        let players = Rc::new(RefCell::new(PlayerRegistry::new()));

        let mut dispatcher = SignalDispatcher::new();
        dispatcher.register(EffectCleanup::new(
            Rc::clone(&effects),
            Rc::clone(&players),
            config.effects.default_gravity,
        ));

        Self {
            config,
            scheduler,
            effects,
            players,
            dispatcher,
            leases: BTreeMap::new(),
        }
    }

    /// Cached player, created with `name` if not yet seen
    pub fn join(&self, userid: UserId, name: &str) -> SimPlayer {
        self.players
            .borrow_mut()
            .get_or_insert_with(userid, || SimPlayer::new(userid, name))
            .clone()
    }

    pub fn player(&self, userid: UserId) -> Result<SimPlayer, String> {
        self.players
            .borrow()
            .get(userid)
            .cloned()
            .ok_or_else(|| format!("no player with userid {userid}"))
    }

    pub fn track(&mut self, handler: EffectHandler<SimPlayer>) {
        self.leases.insert(handler.lease(), handler);
    }

    pub fn lease(&self, id: LeaseId) -> Option<&EffectHandler<SimPlayer>> {
        self.leases.get(&id)
    }

    /// Tracked leases that are still held, oldest first
    pub fn leases(&self) -> impl Iterator<Item = &EffectHandler<SimPlayer>> {
        self.leases.values()
    }

    /// Forget tracked leases that have been cancelled or have expired
    pub fn prune(&mut self) {
        self.leases.retain(|_, handler| handler.is_applied());
    }

    /// Move the game clock forward by `elapsed`
    pub fn advance(&mut self, elapsed: Duration) -> TickReport {
        let report = self.scheduler.advance(elapsed);
        if report.fired > 0 {
            self.prune();
        }
        report
    }

    /// Game time covered by one automatic tick
    pub fn tick_step(&self) -> Duration {
        let sim = &self.config.simulation;
        if !sim.time_scale.is_finite() || sim.time_scale <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_millis(sim.tick_interval_ms).mul_f32(sim.time_scale)
    }
}
