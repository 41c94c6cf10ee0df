// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Seeded random stream owned by a single vessel branch.
#[derive(Clone, Debug)]
pub struct VesselRng {
    inner: ChaCha8Rng,
}

impl VesselRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Derive an independent stream for a child branch.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.random::<u64>()
    }

    /// Uniform sample in `[-1, 1]`.
    pub fn next_signed(&mut self) -> Float {
        self.inner.random_range(-1.0..=1.0)
    }

    pub fn next_signed_vector(&mut self) -> Vector3f {
        Vector3f::new(self.next_signed(), self.next_signed(), self.next_signed())
    }

    /// Three independent normal samples. A non-positive or non-finite spread
    /// collapses to the mean.
    pub fn next_normal_vector(&mut self, mean: Float, std_dev: Float) -> Vector3f {
        match Normal::new(mean, std_dev) {
            Ok(normal) if std_dev > 0.0 => Vector3f::new(
                normal.sample(&mut self.inner),
                normal.sample(&mut self.inner),
                normal.sample(&mut self.inner),
            ),
            _ => Vector3f::new(mean, mean, mean),
        }
    }
}
