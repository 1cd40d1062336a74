//! Benchmark case bodies, one submodule per category.
//!
//! Every case follows the same discipline: preconditions are checked before
//! the iteration loop (unsatisfied ones skip, never crash), per-iteration
//! randomized setup runs with the timer paused, and exactly one HE primitive
//! sits inside the timed window.

pub mod bfv;
pub mod ckks;
pub mod keygen;
pub mod util;

use crate::backend::{HeBackend, SamplePoly};
use crate::env::EnvironmentBundle;

/// Skip reason for cases whose bundle lacks key-switching material.
pub const KEYSWITCH_DISABLED: &str = "key switching is disabled for this parameter set";

/// Overwrite the first `count` scratch ciphertexts (both components each)
/// with fresh uniform randomness from the bundle's dedicated generator.
/// Callers invoke this with the timer paused.
pub(crate) fn refresh_scratch<B: HeBackend>(env: &EnvironmentBundle<B>, count: usize) {
    let mut prng = env.prng_mut();
    let mut scratch = env.scratch_mut();
    for ciphertext in scratch.iter_mut().take(count) {
        prng.sample_uniform(env.context(), ciphertext, 0);
        prng.sample_uniform(env.context(), ciphertext, 1);
    }
}
