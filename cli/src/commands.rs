use std::error::Error;
use std::io::Write;
use std::time::Duration;

use easyfx_core::context::{AppConfig, AppConfigExt};
use easyfx_core::effects::{EffectError, LeaseId};
use easyfx_core::players::shift_property;
use easyfx_core::signal_processor::PlayerSignal;
use easyfx_core::{PlayerEntity, SimPlayer, UserId};
use easyfx_types::EffectKind;

use crate::context::CliContext;

/// Error message with its source chain, `outer: inner: ...`
pub fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn seconds(secs: Option<f32>) -> Result<Option<Duration>, String> {
    secs.map(|s| Duration::try_from_secs_f32(s).map_err(|e| format!("invalid duration {s}: {e}")))
        .transpose()
}

pub fn join(ctx: &CliContext, userid: UserId, name: &str) {
    let existed = ctx.players.borrow().contains(userid);
    let player = ctx.join(userid, name);
    if existed {
        println!("player {userid} already present as {}", player.name());
    } else {
        println!("player {userid} joined as {}", player.name());
    }
}

pub fn apply(
    ctx: &mut CliContext,
    userid: UserId,
    kind: EffectKind,
    duration: Option<f32>,
) -> Result<(), String> {
    let player = ctx.player(userid)?;
    let duration = seconds(duration)?;
    let handler = ctx.effects.handler(kind, &player);

    match handler.activate(duration) {
        Ok(handler) => {
            let lease = handler.lease();
            ctx.track(handler);
            match duration.filter(|d| !d.is_zero()) {
                Some(d) => println!("lease {lease}: {kind} on {userid} for {:.2}s", d.as_secs_f32()),
                None => println!("lease {lease}: {kind} on {userid}"),
            }
            if kind.is_movement() {
                println!("move type now {}", ctx.effects.move_type_of(&player));
            }
            Ok(())
        }
        Err(err @ EffectError::Behavior { .. }) => {
            // The lease is held even though the host write failed
            let lease = handler.lease();
            ctx.track(handler);
            Err(format!("lease {lease} held, but {}", describe(&err)))
        }
        Err(err) => Err(describe(&err)),
    }
}

pub fn cancel(ctx: &mut CliContext, lease: u64) -> Result<(), String> {
    let id = LeaseId::from(lease);
    let handler = ctx
        .lease(id)
        .cloned()
        .ok_or_else(|| format!("no tracked lease {id}"))?;

    let result = handler.cancel();
    ctx.prune();
    match result {
        Ok(true) => println!("lease {id} released"),
        Ok(false) => println!("lease {id} was not held"),
        Err(err) => return Err(describe(&err)),
    }
    Ok(())
}

pub fn cancel_all(ctx: &mut CliContext, userid: UserId) -> Result<(), String> {
    let player = ctx.player(userid)?;
    let result = ctx.effects.cancel_all(&player);
    ctx.prune();
    let released = result.map_err(|err| describe(&err))?;
    println!("released {released} lease(s) on {userid}");
    Ok(())
}

pub fn status(ctx: &CliContext, userid: Option<UserId>) -> Result<(), String> {
    if let Some(userid) = userid {
        print_player(ctx, &ctx.player(userid)?);
        return Ok(());
    }

    let players: Vec<SimPlayer> = ctx.players.borrow().iter().cloned().collect();
    if players.is_empty() {
        println!("no players");
    }
    for player in &players {
        print_player(ctx, player);
    }
    println!("clock {:.3}s, {} timer(s) pending", ctx.scheduler.now().as_secs_f32(), ctx.scheduler.pending_count());
    Ok(())
}

fn print_player(ctx: &CliContext, player: &SimPlayer) {
    let state = player.snapshot();
    let connected = if state.connected { "" } else { " (disconnected)" };
    println!("[{}] {}{connected}", player.userid(), state.name);
    println!("  move type: {}  flags: {:#x}", state.move_type, state.flags);
    println!(
        "  burning: {:.1}s  take damage: {:?}  collision: {:?}",
        state.burning_secs, state.take_damage, state.collision_group
    );

    let mut properties: Vec<_> = state.properties.iter().collect();
    properties.sort_by(|a, b| a.0.cmp(b.0));
    let properties: Vec<String> = properties
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    println!("  properties: {}", properties.join(" "));

    let kinds: Vec<&str> = ctx
        .effects
        .active_kinds(player)
        .into_iter()
        .map(|kind| kind.as_str())
        .collect();
    println!("  effects: {}", if kinds.is_empty() { "-".to_string() } else { kinds.join(", ") });

    for handler in ctx.leases().filter(|h| h.target().userid() == player.userid()) {
        match handler.pending_delay().and_then(|id| ctx.scheduler.time_until(id)) {
            Some(left) => println!(
                "    lease {} {} ({:.2}s left)",
                handler.lease(),
                handler.effect().name(),
                left.as_secs_f32()
            ),
            None => println!("    lease {} {}", handler.lease(), handler.effect().name()),
        }
    }
}

pub fn tick(ctx: &mut CliContext, ms: u64) {
    let report = ctx.advance(Duration::from_millis(ms));
    for failure in &report.failures {
        println!("timer failed: {}", describe(failure));
    }
    println!(
        "clock {:.3}s, {} timer(s) fired",
        ctx.scheduler.now().as_secs_f32(),
        report.fired
    );
}

pub fn shift(
    ctx: &CliContext,
    userid: UserId,
    property: &str,
    amount: f32,
    duration: Option<f32>,
) -> Result<(), String> {
    let player = ctx.player(userid)?;
    let duration = seconds(duration)?;
    let pending = shift_property(&player, property, amount, duration, &*ctx.scheduler)
        .map_err(|err| describe(&err))?;

    let value = player.property(property).map_err(|err| describe(&err))?;
    match pending {
        Some(id) => println!("{property} = {value} on {userid}, reverting via {id}"),
        None => println!("{property} = {value} on {userid}"),
    }
    Ok(())
}

pub fn signal(ctx: &mut CliContext, signal: PlayerSignal) {
    let failures = ctx.dispatcher.dispatch(&signal);
    ctx.prune();
    for failure in &failures {
        println!("cleanup failed: {}", describe(failure));
    }
    println!("{signal} handled");
}

pub fn show_config(ctx: &CliContext, save: bool) -> Result<(), String> {
    println!("{:#?}", ctx.config);
    match AppConfig::config_path() {
        Ok(path) => println!("config file: {}", path.display()),
        Err(err) => println!("config file unavailable: {}", describe(&err)),
    }
    if save {
        ctx.config.save().map_err(|err| describe(&err))?;
        println!("configuration saved");
    }
    Ok(())
}

pub fn exit() -> Result<(), String> {
    writeln!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}
