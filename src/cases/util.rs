//! Shared-utility transform cases.
//!
//! NTT cases are bound to the integer-scheme bundle, FFT (encoding
//! transform) cases to the approximate-scheme bundle for the same ring
//! dimension.

use std::hint::black_box;

use crate::backend::{Evaluate, HeBackend};
use crate::cases::{ckks, refresh_scratch};
use crate::env::EnvironmentBundle;
use crate::error::Result;
use crate::timing::TimingState;

pub fn ntt_fwd<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().transform_to_ntt(&scratch[0])?);
    }
    Ok(())
}

pub fn ntt_inv<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        let ntt_form = {
            let scratch = env.scratch();
            env.evaluator().transform_to_ntt(&scratch[0])?
        };
        state.resume_timing();
        black_box(env.evaluator().transform_from_ntt(&ntt_form)?);
    }
    Ok(())
}

/// The forward encoding transform is exactly the CKKS encode path; the
/// utility label times the same body so the two cannot drift apart.
pub fn fft_fwd<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    ckks::encode_double(state, env)
}

pub fn fft_inv<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    ckks::decode_double(state, env)
}
