use std::fmt;

use crate::entity::UserId;

/// Host lifecycle events that end player effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    PlayerDeath { userid: UserId },
    PlayerDisconnect { userid: UserId },
    /// Map change or server shutdown; every player is affected
    LevelShutdown,
}

impl PlayerSignal {
    /// The player the signal concerns, if it concerns just one
    pub fn userid(&self) -> Option<UserId> {
        match self {
            Self::PlayerDeath { userid } | Self::PlayerDisconnect { userid } => Some(*userid),
            Self::LevelShutdown => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerDeath { .. } => "player_death",
            Self::PlayerDisconnect { .. } => "player_disconnect",
            Self::LevelShutdown => "level_shutdown",
        }
    }
}

impl fmt::Display for PlayerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.userid() {
            Some(userid) => write!(f, "{} ({userid})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}
