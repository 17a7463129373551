use std::io::Write;

use clap::{Parser, Subcommand};
use easyfx_types::EffectKind;

#[derive(Parser, Debug)]
#[command(version, about = "easyfx effect simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Add a player to the simulation
    Join { userid: i32, name: String },
    /// Take a lease of an effect on a player
    Apply {
        userid: i32,
        effect: EffectKind,
        /// Seconds until the lease expires; omit or 0 for indefinite
        #[arg(short, long)]
        duration: Option<f32>,
    },
    /// Give a lease back by id
    Cancel { lease: u64 },
    /// Cancel every effect on a player
    CancelAll { userid: i32 },
    /// Show one player, or every player
    Status { userid: Option<i32> },
    /// Advance the game clock by milliseconds
    Tick { ms: u64 },
    /// Add to a numeric player property
    Shift {
        userid: i32,
        property: String,
        #[arg(allow_hyphen_values = true)]
        amount: f32,
        #[arg(short, long)]
        duration: Option<f32>,
    },
    /// Report a player death
    Kill { userid: i32 },
    /// Report a player disconnect
    Disconnect { userid: i32 },
    /// Report a level shutdown
    Shutdown,
    /// Show configuration, optionally writing it to disk
    Config {
        #[arg(long)]
        save: bool,
    },
    Exit,
}

/// Parse one prompt line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Commands>, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    if args.is_empty() {
        return Ok(None);
    }
    args.insert(0, "easyfx".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    Ok(cli.command)
}

pub fn prompt() -> Result<(), String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "easyfx> ").map_err(|e| e.to_string())?;
    stdout.flush().map_err(|e| e.to_string())
}
