use rand::{rngs::StdRng, Rng, SeedableRng};

/// The random source every part of the simulation draws from.
pub type SimRng = StdRng;

pub fn seeded(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform integer in `[min, max)`. Collapses to `min` on an empty range.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }

    rng.random_range(min..max)
}

/// One of -1, 0 or 1.
pub fn random_step<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.random_range(-1..=1)
}
