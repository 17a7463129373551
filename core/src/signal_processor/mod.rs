//! Player lifecycle signals
//!
//! The host reports deaths, disconnects and level shutdowns as
//! [`PlayerSignal`]s. The [`SignalDispatcher`] fans them out to every
//! registered [`SignalHandler`]; [`EffectCleanup`] is the built-in handler
//! that ends effects on those events.

mod cleanup;
mod dispatcher;
pub mod handler;
pub mod signal;


pub use cleanup::EffectCleanup;
pub use dispatcher::SignalDispatcher;
pub use handler::SignalHandler;
pub use signal::PlayerSignal;
