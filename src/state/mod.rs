//! State management module for the dice roller.
//!
//! This module provides the core state types:
//!
//! - `die` - A single die and its face-count rules
//! - `collection` - Bounded, ordered dice collection
//! - `dice_state` - Observable state that republishes snapshots
//! - `roller` - Random sources
//! - `config` - Configuration loading
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SharedDiceState                         │
//! │                     (Arc<Mutex<..>>)                         │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                      DiceState                         │  │
//! │  │                                                        │  │
//! │  │  ┌──────────────────┐        ┌──────────────────────┐  │  │
//! │  │  │  DiceCollection  │──────▶ │ Arc<DiceSnapshot>    │──┼──┼──▶ subscribers
//! │  │  │                  │publish │  dice, total, count, │  │  │
//! │  │  │  [Die; ≤ cap]    │        │  last_action, seq    │  │  │
//! │  │  └──────────────────┘        └──────────────────────┘  │  │
//! │  │           ▲                                            │  │
//! │  │           │ roll                                       │  │
//! │  │  ┌──────────────────┐                                  │  │
//! │  │  │  RandomSource    │                                  │  │
//! │  │  └──────────────────┘                                  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dice_roller_state::state::{DiceConfig, DiceState};
//!
//! let mut dice = DiceState::with_config(DiceConfig::default())?;
//! let (_, updates) = dice.subscribe_channel();
//! dice.add_die(12);
//! dice.roll_all_dice();
//! ```

pub mod collection;
pub mod config;
pub mod dice_state;
pub mod die;
pub mod roller;

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export commonly used types
pub use collection::{DiceCollection, DEFAULT_CAPACITY};
pub use config::{ConfigError, DiceConfig, DEFAULT_WELCOME_MESSAGE};
pub use dice_state::{DiceSnapshot, DiceState, SubscriptionId};
pub use die::{is_valid_faces, DiceError, Die, MAX_FACES, MIN_FACES};
pub use roller::{RandomSource, Roller, ScriptedRolls};

/// Dice state shared across threads.
///
/// Every operation takes the same lock, so mutations are applied one at a
/// time and subscribers see them in order. Callbacks run while the lock is
/// held and must not call back into the same handle.
#[derive(Debug)]
pub struct SharedDiceState<R: RandomSource = Roller> {
    inner: Arc<Mutex<DiceState<R>>>,
}

impl<R: RandomSource> Clone for SharedDiceState<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RandomSource> From<DiceState<R>> for SharedDiceState<R> {
    fn from(state: DiceState<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }
}

impl Default for SharedDiceState<Roller> {
    fn default() -> Self {
        Self::from(DiceState::new())
    }
}

impl<R: RandomSource> SharedDiceState<R> {
    pub fn new(state: DiceState<R>) -> Self {
        Self::from(state)
    }

    // State is consistent between operations, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, DiceState<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_die(&self, faces: u32) -> bool {
        self.lock().add_die(faces)
    }

    pub fn remove_die(&self, id: u32) -> bool {
        self.lock().remove_die(id)
    }

    pub fn roll_all_dice(&self) {
        self.lock().roll_all_dice()
    }

    pub fn roll_single_die(&self, id: u32) -> bool {
        self.lock().roll_single_die(id)
    }

    pub fn clear_dice(&self) {
        self.lock().clear_dice()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<DiceSnapshot> {
        self.lock().snapshot()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DiceSnapshot) + Send + 'static,
    {
        self.lock().subscribe(callback)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<Arc<DiceSnapshot>>) {
        self.lock().subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().unsubscribe(id)
    }

    /// Run `f` with exclusive access to the state.
    pub fn with<T>(&self, f: impl FnOnce(&mut DiceState<R>) -> T) -> T {
        f(&mut *self.lock())
    }
}
