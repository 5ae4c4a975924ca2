//! Seeded 64-bit linear congruential generator.
//!
//! Simulation paths must be reproducible bit-for-bit from `(seed, path)`,
//! independent of platform and `rand` version, so the generator is defined
//! here rather than borrowed from `rand::rngs`. It still implements
//! `RngCore`/`SeedableRng` so it can drive any `rand` distribution.

use rand::{RngCore, SeedableRng};
use std::f64::consts::TAU;

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const INCREMENT: u64 = 1_442_695_040_888_963_407;
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
    spare_normal: Option<f64>,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed,
            spare_normal: None,
        }
    }

    /// Independent stream for one simulation path.
    pub fn for_path(seed: u64, path: u64) -> Self {
        Self::new(splitmix64(seed ^ splitmix64(path)))
    }

    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.state
    }

    /// Uniform draw strictly inside (0, 1).
    pub fn next_unit(&mut self) -> f64 {
        (f64::from(self.next_u32()) + 0.5) / TWO_POW_32
    }

    /// Standard normal draw via the Box-Muller transform.
    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare_normal.take() {
            return z;
        }
        let u1 = self.next_unit();
        let u2 = self.next_unit();
        let radius = (-2.0 * u1.ln()).sqrt();
        self.spare_normal = Some(radius * (TAU * u2).sin());
        radius * (TAU * u2).cos()
    }
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        // High bits of an LCG have the longest period.
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Lcg {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Lcg::seed_from_u64(42);
        let mut b = Lcg::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_paths_are_distinct_streams() {
        let mut p0 = Lcg::for_path(42, 0);
        let mut p1 = Lcg::for_path(42, 1);
        let s0: Vec<u32> = (0..8).map(|_| p0.next_u32()).collect();
        let s1: Vec<u32> = (0..8).map(|_| p1.next_u32()).collect();
        assert_ne!(s0, s1);
    }

    #[test]
    fn test_unit_draws_stay_open_interval() {
        let mut rng = Lcg::new(7);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = Lcg::new(42);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn test_drives_rand_distributions() {
        let mut rng = Lcg::seed_from_u64(1);
        let x: f64 = rng.gen_range(10.0..20.0);
        assert!((10.0..20.0).contains(&x));
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
    }
}
