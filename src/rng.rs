//! Random sources for synthetic data.
//!
//! Every draw in the dashboard goes through [`RandomSource`], a single method
//! returning a float in `[0, 1)`. The helpers on top of it (`uniform`,
//! `uniform_int`, `coin`) define the exact mapping from a unit draw to a value,
//! so a scripted source reproduces the same numbers on every run.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Next draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Uniform float in `[min, max)`.
pub fn uniform(rng: &mut (impl RandomSource + ?Sized), min: f64, max: f64) -> f64 {
    rng.next_unit() * (max - min) + min
}

/// Uniform integer in `[min, max]`, both ends inclusive.
pub fn uniform_int(rng: &mut (impl RandomSource + ?Sized), min: i64, max: i64) -> i64 {
    let span = (max - min + 1) as f64;
    let offset = (rng.next_unit() * span).floor() as i64;
    // A draw of exactly 1.0 from a misbehaving source must not escape the range.
    min + offset.min(max - min)
}

/// Even odds: true when the draw lands above one half.
pub fn coin(rng: &mut (impl RandomSource + ?Sized)) -> bool {
    rng.next_unit() > 0.5
}

/// Pick one element uniformly.
pub fn pick<'a, T>(rng: &mut (impl RandomSource + ?Sized), items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = uniform_int(rng, 0, items.len() as i64 - 1) as usize;
    items.get(idx)
}

/// Process-wide thread RNG; the default for interactive sessions.
pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Seeded generator for reproducible runs.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    idx: usize,
}

impl ScriptedRandom {
    pub fn new(draws: Vec<f64>) -> Self {
        let draws = if draws.is_empty() { vec![0.0] } else { draws };
        let draws = draws
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, idx: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.idx
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        let value = self.draws[self.idx % self.draws.len()];
        self.idx += 1;
        value
    }
}
