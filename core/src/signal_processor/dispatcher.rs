use super::handler::SignalHandler;
use super::signal::PlayerSignal;
use crate::effects::EffectError;

/// Fans signals out to every registered handler, in registration order.
#[derive(Default)]
pub struct SignalDispatcher {
    handlers: Vec<Box<dyn SignalHandler>>,
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl SignalHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `signal` to every handler. A failing handler does not stop
    /// the others; all failures are returned.
    pub fn dispatch(&mut self, signal: &PlayerSignal) -> Vec<EffectError> {
        tracing::debug!(%signal, handlers = self.handlers.len(), "Dispatching signal");

        let mut failures = Vec::new();
        for handler in &mut self.handlers {
            if let Err(err) = handler.handle_signal(signal) {
                tracing::error!(handler = handler.name(), %signal, error = %err, "Signal handler failed");
                failures.push(err);
            }
        }
        failures
    }
}
