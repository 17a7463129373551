//! Shared player-state and configuration types for easyfx
//!
//! This crate contains serializable types that are shared between the
//! effect engine (easyfx-core) and the command-line front end (easyfx-cli).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Player State
// ─────────────────────────────────────────────────────────────────────────────

/// Externally visible movement mode of a player.
///
/// Only one mode can be in effect at a time; the move-type resolver picks
/// it from the active movement effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    #[default]
    Walk,
    Noclip,
    /// No movement at all (engine `MOVETYPE_NONE`)
    Freeze,
    Fly,
}

impl MoveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveType::Walk => "walk",
            MoveType::Noclip => "noclip",
            MoveType::Freeze => "freeze",
            MoveType::Fly => "fly",
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Damage reception mode (engine `m_takedamage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TakeDamage {
    No = 0,
    EventsOnly = 1,
    #[default]
    Yes = 2,
    Aim = 3,
}

/// Collision group of an entity. Only the groups players move between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CollisionGroup {
    /// Collides with triggers but not with other players
    DebrisTrigger = 2,
    #[default]
    Player = 5,
}

/// Player state flag: the player can't move or look around.
pub const FL_FROZEN: u32 = 1 << 6;

// ─────────────────────────────────────────────────────────────────────────────
// Effect Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The built-in player effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Noclip,
    Freeze,
    Fly,
    Paralyze,
    Burn,
    Godmode,
    Noblock,
}

impl EffectKind {
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Noclip,
        EffectKind::Freeze,
        EffectKind::Fly,
        EffectKind::Paralyze,
        EffectKind::Burn,
        EffectKind::Godmode,
        EffectKind::Noblock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Noclip => "noclip",
            EffectKind::Freeze => "freeze",
            EffectKind::Fly => "fly",
            EffectKind::Paralyze => "paralyze",
            EffectKind::Burn => "burn",
            EffectKind::Godmode => "godmode",
            EffectKind::Noblock => "noblock",
        }
    }

    /// Returns true for the effects that compete for the move type
    pub fn is_movement(&self) -> bool {
        matches!(self, EffectKind::Noclip | EffectKind::Freeze | EffectKind::Fly)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown effect name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEffectKind(pub String);

impl fmt::Display for UnknownEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown effect '{}'", self.0)
    }
}

impl std::error::Error for UnknownEffectKind {}

impl FromStr for EffectKind {
    type Err = UnknownEffectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| UnknownEffectKind(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn default_burn_lifetime_secs() -> f32 {
    3600.0
}

fn default_gravity() -> f32 {
    1.0
}

fn default_tick_interval_ms() -> u64 {
    15
}

fn default_time_scale() -> f32 {
    1.0
}

/// Tunables for the built-in player effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    /// Ignite lifetime used while a player burns
    #[serde(default = "default_burn_lifetime_secs")]
    pub burn_lifetime_secs: f32,

    /// Gravity a player is reset to on death
    #[serde(default = "default_gravity")]
    pub default_gravity: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            burn_lifetime_secs: default_burn_lifetime_secs(),
            default_gravity: default_gravity(),
        }
    }
}

/// Settings for the simulated server clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Real milliseconds between scheduler ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Game seconds per real second
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            time_scale: default_time_scale(),
        }
    }
}

/// Persistent application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub effects: EffectSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}
