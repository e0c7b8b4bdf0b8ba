//! The model's deterministic random source.
//!
//! # Determinism strategy
//!
//! Every model owns exactly one `ModelRng`, seeded once at construction.
//! Given the same seed and the same sequence of engine operations, two runs
//! draw identical values, which is the whole reproducibility contract of the
//! engine.
//!
//! The generator is `ChaCha8Rng` rather than `SmallRng`: ChaCha's state
//! serializes, so a binary checkpoint restores mid-run randomness exactly.
//! Ensemble workers never share this generator — each worker derives its own
//! via [`ModelRng::child`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 64-bit fractional golden-ratio constant for child-seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seedable, checkpointable RNG owned by a model.
///
/// All engine-level sampling (random positions, scheduler shuffles, rejection
/// sampling) goes through this type so replays stay bit-identical.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ModelRng(ChaCha8Rng);

impl ModelRng {
    /// Seed deterministically from a 64-bit value.
    pub fn seeded(seed: u64) -> Self {
        ModelRng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Derive an independent `ModelRng` with a different seed offset — used
    /// to seed per-worker generators deterministically for ensembles.
    pub fn child(&mut self, offset: u64) -> ModelRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        ModelRng(ChaCha8Rng::seed_from_u64(child_seed))
    }

    /// Expose the inner generator for use with `rand` distribution types
    /// (`rng.inner().sample(...)`, etc.).
    #[inline]
    pub fn inner(&mut self) -> &mut ChaCha8Rng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }

    /// Choose a random element from a slice.  Returns `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// Sample from any `rand` distribution — `rand_distr` types plug in here
    /// (`rng.sample(StandardNormal)`, `rng.sample(UnitSphere)`, …).
    #[inline]
    pub fn sample<T, D>(&mut self, dist: D) -> T
    where
        D: rand::distributions::Distribution<T>,
    {
        dist.sample(&mut self.0)
    }
}
