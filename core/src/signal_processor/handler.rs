use super::signal::PlayerSignal;
use crate::effects::EffectError;

/// Trait for systems that react to player lifecycle signals.
pub trait SignalHandler {
    /// Handle a single signal.
    fn handle_signal(&mut self, signal: &PlayerSignal) -> Result<(), EffectError>;

    /// Handle multiple signals (default implementation calls handle_signal
    /// for each and stops at the first error)
    fn handle_signals(&mut self, signals: &[PlayerSignal]) -> Result<(), EffectError> {
        for signal in signals {
            self.handle_signal(signal)?;
        }
        Ok(())
    }

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
