use hashbrown::HashMap;

use crate::entity::{PlayerEntity, UserId};

/// Cache of player handles keyed by user id.
///
/// Handles are created on first lookup and stay cached until the player
/// is discarded (disconnect) or the whole cache is cleared (level shutdown).
#[derive(Debug)]
pub struct PlayerRegistry<E: PlayerEntity> {
    players: HashMap<UserId, E>,
}

impl<E: PlayerEntity> Default for PlayerRegistry<E> {
    fn default() -> Self {
        Self {
            players: HashMap::new(),
        }
    }
}

impl<E: PlayerEntity> PlayerRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle for `userid`, created with `create` on first use
    pub fn get_or_insert_with(&mut self, userid: UserId, create: impl FnOnce() -> E) -> &E {
        self.players.entry(userid).or_insert_with(|| {
            tracing::debug!(userid, "Player cached");
            create()
        })
    }

    pub fn get(&self, userid: UserId) -> Option<&E> {
        self.players.get(&userid)
    }

    pub fn contains(&self, userid: UserId) -> bool {
        self.players.contains_key(&userid)
    }

    /// Drop the cached handle, returning it if present
    pub fn discard(&mut self, userid: UserId) -> Option<E> {
        let removed = self.players.remove(&userid);
        if removed.is_some() {
            tracing::debug!(userid, "Player discarded");
        }
        removed
    }

    /// Drop every cached handle, returning how many there were
    pub fn discard_all(&mut self) -> usize {
        let count = self.players.len();
        self.players.clear();
        tracing::debug!(count, "Player cache cleared");
        count
    }

    /// Cached players in ascending user id order
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        let mut players: Vec<&E> = self.players.values().collect();
        players.sort_by_key(|p| p.userid());
        players.into_iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
