//! Random sources for rolling dice.
//!
//! Every roll asks the source for a fresh draw; nothing is cached.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Uniform integer draws over `[1, faces]`.
pub trait RandomSource {
    /// Draw a value in `1..=faces`. Callers guarantee `faces >= 2`.
    fn roll(&mut self, faces: u32) -> u32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn roll(&mut self, faces: u32) -> u32 {
        (**self).roll(faces)
    }
}

/// Default random source backed by `StdRng`.
#[derive(Debug)]
pub struct Roller {
    rng: StdRng,
}

impl Roller {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible roller for tests and replays.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is given, OS entropy otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::new(),
        }
    }
}

impl RandomSource for Roller {
    fn roll(&mut self, faces: u32) -> u32 {
        self.rng.random_range(1..=faces)
    }
}

/// Replays a fixed script of values, cycling when exhausted.
///
/// Values are clamped into `[1, faces]` so a script written for large dice
/// stays valid on small ones.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedRolls {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of draws handed out so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRolls {
    fn roll(&mut self, faces: u32) -> u32 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 1;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(1, faces)
    }
}
