//! In-memory player entity
//!
//! `SimPlayer` stands in for a host player: every attribute lives in a
//! per-player store shared by all handles to the same player. Used by the
//! CLI simulator and by tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use easyfx_types::{CollisionGroup, MoveType, TakeDamage};
use hashbrown::HashMap;

use crate::entity::{HostError, PlayerEntity, Target, UserId};

/// Numeric properties every simulated player starts with
pub const DEFAULT_PROPERTIES: [(&str, f32); 3] = [("gravity", 1.0), ("speed", 1.0), ("health", 100.0)];

/// Number of move type writes kept per player
pub const MOVE_TYPE_HISTORY_LEN: usize = 16;

/// Attribute store of a simulated player
#[derive(Debug, Clone, PartialEq)]
pub struct SimPlayerState {
    pub name: String,
    pub connected: bool,
    pub move_type: MoveType,
    pub flags: u32,
    /// Ignite lifetime last set; zero when extinguished. Not counted down.
    pub burning_secs: f32,
    pub take_damage: TakeDamage,
    pub collision_group: CollisionGroup,
    pub properties: HashMap<String, f32>,
    /// Most recent move type writes, oldest first
    pub move_type_history: VecDeque<MoveType>,
}

/// Cheap handle to a simulated player; clones share the same store.
#[derive(Debug, Clone)]
pub struct SimPlayer {
    userid: UserId,
    state: Rc<RefCell<SimPlayerState>>,
}

impl SimPlayer {
    pub fn new(userid: UserId, name: impl Into<String>) -> Self {
        let properties = DEFAULT_PROPERTIES
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();

        Self {
            userid,
            state: Rc::new(RefCell::new(SimPlayerState {
                name: name.into(),
                connected: true,
                move_type: MoveType::Walk,
                flags: 0,
                burning_secs: 0.0,
                take_damage: TakeDamage::Yes,
                collision_group: CollisionGroup::Player,
                properties,
                move_type_history: VecDeque::with_capacity(MOVE_TYPE_HISTORY_LEN),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    /// Copy of the current attribute store
    pub fn snapshot(&self) -> SimPlayerState {
        self.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Invalidate the entity: every later read or write fails
    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }

    fn gone(&self) -> HostError {
        HostError::EntityGone {
            entity: self.userid.to_string(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&SimPlayerState) -> R) -> Result<R, HostError> {
        let state = self.state.borrow();
        if !state.connected {
            return Err(self.gone());
        }
        Ok(f(&state))
    }

    fn write(&self, f: impl FnOnce(&mut SimPlayerState)) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(self.gone());
        }
        f(&mut state);
        Ok(())
    }
}

impl Target for SimPlayer {
    type Key = UserId;

    fn identity(&self) -> UserId {
        self.userid
    }
}

impl PlayerEntity for SimPlayer {
    fn move_type(&self) -> Result<MoveType, HostError> {
        self.read(|s| s.move_type)
    }

    fn set_move_type(&self, move_type: MoveType) -> Result<(), HostError> {
        self.write(|s| {
            s.move_type = move_type;
            if s.move_type_history.len() == MOVE_TYPE_HISTORY_LEN {
                s.move_type_history.pop_front();
            }
            s.move_type_history.push_back(move_type);
        })
    }

    fn flags(&self) -> Result<u32, HostError> {
        self.read(|s| s.flags)
    }

    fn set_flags(&self, flags: u32) -> Result<(), HostError> {
        self.write(|s| s.flags = flags)
    }

    fn ignite_lifetime(&self, secs: f32) -> Result<(), HostError> {
        self.write(|s| s.burning_secs = secs.max(0.0))
    }

    fn set_take_damage(&self, mode: TakeDamage) -> Result<(), HostError> {
        self.write(|s| s.take_damage = mode)
    }

    fn set_collision_group(&self, group: CollisionGroup) -> Result<(), HostError> {
        self.write(|s| s.collision_group = group)
    }

    fn property(&self, name: &str) -> Result<f32, HostError> {
        self.read(|s| s.properties.get(name).copied())?
            .ok_or_else(|| HostError::UnknownProperty {
                entity: self.userid.to_string(),
                name: name.to_string(),
            })
    }

    fn set_property(&self, name: &str, value: f32) -> Result<(), HostError> {
        self.write(|s| {
            s.properties.insert(name.to_string(), value);
        })
    }
}
