use easyfx_cli::commands;
use easyfx_cli::logging;
use easyfx_cli::{CliContext, Commands, parse_line, prompt};
use easyfx_core::context::{AppConfig, AppConfigExt};
use easyfx_core::signal_processor::PlayerSignal;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let mut ctx = CliContext::new(AppConfig::load());

    // A zero interval disables the automatic clock; use `tick` instead
    let auto_tick = ctx.config.simulation.tick_interval_ms > 0;
    let period = Duration::from_millis(ctx.config.simulation.tick_interval_ms.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| e.to_string())? else {
                    break;
                };
                match respond(&line, &mut ctx) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(err) => println!("{err}"),
                }
                prompt()?;
            }
            _ = ticker.tick(), if auto_tick => {
                let report = ctx.advance(ctx.tick_step());
                for failure in &report.failures {
                    tracing::warn!(error = %commands::describe(failure), "Timer failed");
                }
            }
        }
    }

    tracing::info!("easyfx shutting down");
    Ok(())
}

fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let Some(command) = parse_line(line)? else {
        return Ok(false);
    };

    match command {
        Commands::Join { userid, name } => commands::join(ctx, userid, &name),
        Commands::Apply {
            userid,
            effect,
            duration,
        } => commands::apply(ctx, userid, effect, duration)?,
        Commands::Cancel { lease } => commands::cancel(ctx, lease)?,
        Commands::CancelAll { userid } => commands::cancel_all(ctx, userid)?,
        Commands::Status { userid } => commands::status(ctx, userid)?,
        Commands::Tick { ms } => commands::tick(ctx, ms),
        Commands::Shift {
            userid,
            property,
            amount,
            duration,
        } => commands::shift(ctx, userid, &property, amount, duration)?,
        Commands::Kill { userid } => commands::signal(ctx, PlayerSignal::PlayerDeath { userid }),
        Commands::Disconnect { userid } => {
            commands::signal(ctx, PlayerSignal::PlayerDisconnect { userid })
        }
        Commands::Shutdown => commands::signal(ctx, PlayerSignal::LevelShutdown),
        Commands::Config { save } => commands::show_config(ctx, save)?,
        Commands::Exit => {
            commands::exit()?;
            return Ok(true);
        }
    }
    Ok(false)
}
