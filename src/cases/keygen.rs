//! Key-generation cases, shared by both scheme variants.

use std::hint::black_box;

use crate::backend::{HeBackend, HeContext};
use crate::cases::KEYSWITCH_DISABLED;
use crate::env::EnvironmentBundle;
use crate::error::Result;
use crate::timing::TimingState;

pub fn secret<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        black_box(env.context().generate_secret_key());
    }
    Ok(())
}

pub fn public<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        black_box(env.context().derive_public_key(env.secret_key()));
    }
    Ok(())
}

pub fn relin<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    if !env.context().using_keyswitching() {
        state.skip_with_reason(KEYSWITCH_DISABLED);
        return Ok(());
    }
    while state.keep_running() {
        black_box(env.context().create_relin_keys(env.secret_key())?);
    }
    Ok(())
}

pub fn galois<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    if !env.context().using_keyswitching() {
        state.skip_with_reason(KEYSWITCH_DISABLED);
        return Ok(());
    }
    while state.keep_running() {
        black_box(env.context().create_galois_keys(env.secret_key())?);
    }
    Ok(())
}
