use std::time::Duration;

use crate::effects::EffectError;
use crate::entity::{HostError, PlayerEntity};
use crate::scheduler::{DelayId, Scheduler};

/// Add `shift` to the player's `name` property.
///
/// With a positive `duration` the same amount is subtracted again once it
/// elapses and the id of that pending revert is returned. Shifts stack
/// additively, so overlapping shifts of one property unwind cleanly in any
/// order.
pub fn shift_property<E: PlayerEntity>(
    player: &E,
    name: &str,
    shift: f32,
    duration: Option<Duration>,
    scheduler: &dyn Scheduler,
) -> Result<Option<DelayId>, HostError> {
    let current = player.property(name)?;
    player.set_property(name, current + shift)?;
    tracing::debug!(userid = player.userid(), property = name, shift, "Property shifted");

    let Some(duration) = duration.filter(|d| !d.is_zero()) else {
        return Ok(None);
    };

    let target = player.clone();
    let property = name.to_string();
    let id = scheduler.delay(
        duration,
        Box::new(move || -> Result<(), EffectError> {
            let current = target.property(&property)?;
            target.set_property(&property, current - shift)?;
            tracing::debug!(userid = target.userid(), %property, shift, "Property shift reverted");
            Ok(())
        }),
    );
    Ok(Some(id))
}
