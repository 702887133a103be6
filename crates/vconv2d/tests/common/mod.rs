#![allow(dead_code)]

use std::ops::RangeInclusive;

use rand::distr::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `len` values drawn uniformly from `range`.
pub fn random_vec<T>(rng: &mut ChaCha8Rng, len: usize, range: RangeInclusive<T>) -> Vec<T>
where
    T: SampleUniform + PartialOrd + Copy,
{
    (0..len).map(|_| rng.random_range(range.clone())).collect()
}

/// Lossless widening of every element.
pub fn widen<A: Copy, B: From<A>>(v: &[A]) -> Vec<B> {
    v.iter().map(|&x| B::from(x)).collect()
}
