pub mod context;
pub mod effects;
pub mod entity;
pub mod players;
pub mod scheduler;
pub mod signal_processor;
pub mod sim;

// Re-exports for convenience
pub use context::{AppConfig, AppConfigExt, ConfigError};
pub use effects::{
    Effect, EffectError, EffectHandler, LeaseId, MoveTypeResolver, PlayerEffects, Transition,
};
pub use entity::{HostError, PlayerEntity, Target, UserId};
pub use players::{PlayerRegistry, shift_property};
pub use scheduler::{DelayId, Scheduler, TickReport, TickScheduler};
pub use signal_processor::{EffectCleanup, PlayerSignal, SignalDispatcher, SignalHandler};
pub use sim::SimPlayer;
