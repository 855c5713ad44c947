//! A single die.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::roller::RandomSource;

/// Fewest faces a die may have.
pub const MIN_FACES: u32 = 2;

/// Most faces a die may have.
pub const MAX_FACES: u32 = 100;

/// Check a face count against `[MIN_FACES, MAX_FACES]`.
pub fn is_valid_faces(faces: u32) -> bool {
    (MIN_FACES..=MAX_FACES).contains(&faces)
}

/// Dice errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("a die must have between 2 and 100 faces, got {0}")]
    InvalidFaceCount(u32),

    #[error("dice set is full (max {capacity})")]
    CollectionFull { capacity: usize },

    #[error("no die with id {0}")]
    NotFound(u32),

    #[error("value {value} is outside 1..={faces}")]
    InvalidValue { value: u32, faces: u32 },
}

/// One die: identity, face count, and the value it last landed on.
///
/// Deserialized dice go through the same face and value checks as
/// [`Die::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDie")]
pub struct Die {
    id: u32,
    faces: u32,
    current_value: u32,
}

impl Die {
    /// Create a die and roll it once.
    pub fn new<R: RandomSource>(id: u32, faces: u32, rng: &mut R) -> Result<Self, DiceError> {
        Self::create(id, faces, true, rng)
    }

    /// Create a die, optionally skipping the initial roll.
    ///
    /// An unrolled die shows 1.
    pub fn create<R: RandomSource>(
        id: u32,
        faces: u32,
        initial_roll: bool,
        rng: &mut R,
    ) -> Result<Self, DiceError> {
        if !is_valid_faces(faces) {
            return Err(DiceError::InvalidFaceCount(faces));
        }

        let mut die = Self {
            id,
            faces,
            current_value: 1,
        };
        if initial_roll {
            die.roll(rng);
        }
        Ok(die)
    }

    /// Redraw the value. Returns the new value.
    pub fn roll<R: RandomSource>(&mut self, rng: &mut R) -> u32 {
        self.current_value = rng.roll(self.faces);
        self.current_value
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn faces(&self) -> u32 {
        self.faces
    }

    pub fn current_value(&self) -> u32 {
        self.current_value
    }

    /// Tabletop name, e.g. `D20`.
    pub fn label(&self) -> String {
        format!("D{}", self.faces)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "faces": self.faces,
            "current_value": self.current_value
        })
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Die {} (D{}): {}", self.id, self.faces, self.current_value)
    }
}

/// Unchecked wire form of a [`Die`].
#[derive(Deserialize)]
struct RawDie {
    id: u32,
    faces: u32,
    current_value: u32,
}

impl TryFrom<RawDie> for Die {
    type Error = DiceError;

    fn try_from(raw: RawDie) -> Result<Self, Self::Error> {
        if !is_valid_faces(raw.faces) {
            return Err(DiceError::InvalidFaceCount(raw.faces));
        }

        if !(1..=raw.faces).contains(&raw.current_value) {
            return Err(DiceError::InvalidValue {
                value: raw.current_value,
                faces: raw.faces,
            });
        }

        Ok(Self {
            id: raw.id,
            faces: raw.faces,
            current_value: raw.current_value,
        })
    }
}
