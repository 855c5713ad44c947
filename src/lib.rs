//! Dice Roller State Library
//!
//! This crate provides state management for a dice-rolling app.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Dice** - A die with a face count in `[2, 100]` and a value rolled
//!   uniformly from `[1, faces]`.
//!
//! - **Dice Collection** - An ordered set of dice with a fixed capacity,
//!   session-unique ids, and add/remove/roll/clear operations.
//!
//! - **Observable State** - Wraps a collection and republishes an immutable
//!   snapshot (dice, total, count, last-action message) after every operation.
//!
//! # Design Principles
//!
//! 1. **Failures are results** - A full set, a bad face count, or an unknown id
//!    never panics; the collection reports an error and stays unchanged.
//!
//! 2. **Snapshots, not references** - Observers only ever see owned copies
//!    published after a mutation completes.
//!
//! 3. **No UI** - This crate is pure state; screens and dialogs read snapshots
//!    and call operations.
//!
//! 4. **Serialization-ready** - Dice and snapshots can be converted to JSON.
//!
//! # Example
//!
//! ```rust
//! use dice_roller_state::state::{DiceConfig, DiceState, Roller};
//!
//! let config = DiceConfig {
//!     starter_dice: Vec::new(),
//!     ..DiceConfig::default()
//! };
//! let mut dice = DiceState::with_source(config, Roller::from_seed(7)).unwrap();
//!
//! // Observe every change, starting with the current state
//! let (_, updates) = dice.subscribe_channel();
//!
//! assert!(dice.add_die(6));
//! assert_eq!(dice.last_action_message(), "Added a D6.");
//!
//! dice.roll_all_dice();
//! assert!((1..=6).contains(&dice.total()));
//!
//! assert!(!dice.remove_die(99));
//! assert_eq!(dice.last_action_message(), "Failed to remove die 99. Not found.");
//!
//! assert_eq!(updates.try_iter().count(), 4);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
