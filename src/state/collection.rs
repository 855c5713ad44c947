//! Bounded, ordered collection of dice.
//!
//! The collection owns every die it holds. Callers read copies through
//! [`DiceCollection::snapshot`] or borrow through [`DiceCollection::get`];
//! nothing hands out a mutable reference into the list.

use super::die::{is_valid_faces, DiceError, Die};
use super::roller::RandomSource;

/// Default number of dice a collection holds.
pub const DEFAULT_CAPACITY: usize = 6;

/// Ordered dice with a hard capacity ceiling.
#[derive(Debug, Clone)]
pub struct DiceCollection {
    /// Maximum dice allowed
    capacity: usize,

    /// Dice in insertion order
    dice: Vec<Die>,

    /// Id handed to the next added die
    next_id: u32,

    /// Whether `clear` restarts ids at 1
    reset_ids_on_clear: bool,
}

impl Default for DiceCollection {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiceCollection {
    /// Create an empty collection. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            dice: Vec::new(),
            next_id: 1,
            reset_ids_on_clear: true,
        }
    }

    /// Choose whether `clear` restarts ids at 1 (the default) or keeps counting.
    pub fn with_id_reset_on_clear(mut self, reset: bool) -> Self {
        self.reset_ids_on_clear = reset;
        self
    }

    /// Add a new die with `faces` faces, rolled once.
    ///
    /// A full collection rejects the add before `faces` is looked at.
    pub fn add<R: RandomSource>(&mut self, faces: u32, rng: &mut R) -> Result<Die, DiceError> {
        if self.is_full() {
            return Err(DiceError::CollectionFull {
                capacity: self.capacity,
            });
        }

        if !is_valid_faces(faces) {
            return Err(DiceError::InvalidFaceCount(faces));
        }

        let die = Die::new(self.next_id, faces, rng)?;
        self.next_id += 1;
        self.dice.push(die.clone());

        Ok(die)
    }

    /// Remove a die by id, returning it.
    pub fn remove(&mut self, id: u32) -> Result<Die, DiceError> {
        let index = self.position(id).ok_or(DiceError::NotFound(id))?;
        Ok(self.dice.remove(index))
    }

    /// Re-roll every die in insertion order.
    pub fn roll_all<R: RandomSource>(&mut self, rng: &mut R) {
        for die in &mut self.dice {
            die.roll(rng);
        }
    }

    /// Re-roll one die, returning a copy of it after the roll.
    pub fn roll_one<R: RandomSource>(&mut self, id: u32, rng: &mut R) -> Result<Die, DiceError> {
        let index = self.position(id).ok_or(DiceError::NotFound(id))?;
        let die = &mut self.dice[index];
        die.roll(rng);
        Ok(die.clone())
    }

    /// Remove every die. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.dice.len();
        self.dice.clear();
        if self.reset_ids_on_clear {
            self.next_id = 1;
        }
        removed
    }

    /// Sum of all current values.
    pub fn total(&self) -> u32 {
        self.dice.iter().map(Die::current_value).sum()
    }

    /// Number of dice.
    pub fn size(&self) -> usize {
        self.dice.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots left.
    pub fn remaining(&self) -> usize {
        self.capacity - self.dice.len()
    }

    pub fn is_full(&self) -> bool {
        self.dice.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Get a die by id.
    pub fn get(&self, id: u32) -> Option<&Die> {
        self.dice.iter().find(|d| d.id() == id)
    }

    /// Check if a die with this id is present.
    pub fn contains(&self, id: u32) -> bool {
        self.position(id).is_some()
    }

    /// Owned copy of the dice in insertion order.
    pub fn snapshot(&self) -> Vec<Die> {
        self.dice.clone()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.dice.iter().map(Die::id)
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.dice.iter().position(|d| d.id() == id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let dice: Vec<serde_json::Value> = self.dice.iter().map(|d| d.to_json()).collect();

        serde_json::json!({
            "capacity": self.capacity,
            "count": self.size(),
            "total": self.total(),
            "dice": dice
        })
    }
}
