//! Integer-scheme (BFV) cases.

use std::hint::black_box;

use crate::backend::{BatchEncode, Decrypt, Encrypt, Evaluate, HeBackend, HeContext};
use crate::cases::{refresh_scratch, KEYSWITCH_DISABLED};
use crate::env::EnvironmentBundle;
use crate::error::Result;
use crate::timing::TimingState;

fn batch_values<B: HeBackend>(env: &EnvironmentBundle<B>) -> Vec<u64> {
    (0..env.context().poly_modulus_degree() as u64).collect()
}

pub fn encode_batch<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let encoder = env.batch_encoder()?;
    let values = batch_values(env);
    while state.keep_running() {
        black_box(encoder.encode(&values)?);
    }
    Ok(())
}

pub fn decode_batch<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let encoder = env.batch_encoder()?;
    let plain = encoder.encode(&batch_values(env))?;
    while state.keep_running() {
        black_box(encoder.decode(&plain)?);
    }
    Ok(())
}

pub fn encrypt_pk<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let plain = env.batch_encoder()?.encode(&batch_values(env))?;
    while state.keep_running() {
        black_box(env.encryptor().encrypt(&plain)?);
    }
    Ok(())
}

pub fn encrypt_sk<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let plain = env.batch_encoder()?.encode(&batch_values(env))?;
    while state.keep_running() {
        black_box(env.encryptor().encrypt_symmetric(&plain)?);
    }
    Ok(())
}

pub fn decrypt<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let plain = env.batch_encoder()?.encode(&batch_values(env))?;
    let ciphertext = env.encryptor().encrypt(&plain)?;
    while state.keep_running() {
        black_box(env.decryptor().decrypt(&ciphertext)?);
    }
    Ok(())
}

pub fn add_ct<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 2);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().add(&scratch[0], &scratch[1])?);
    }
    Ok(())
}

pub fn mul_ct<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 2);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().multiply(&scratch[0], &scratch[1])?);
    }
    Ok(())
}

pub fn mul_pt<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let plain = env.batch_encoder()?.encode(&batch_values(env))?;
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().multiply_plain(&scratch[0], &plain)?);
    }
    Ok(())
}

pub fn square<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().square(&scratch[0])?);
    }
    Ok(())
}

pub fn relin<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let Some(relin_keys) = env.relin_keys() else {
        state.skip_with_reason(KEYSWITCH_DISABLED);
        return Ok(());
    };
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().relinearize(&scratch[0], relin_keys)?);
    }
    Ok(())
}

pub fn rotate_rows<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let Some(galois_keys) = env.galois_keys() else {
        state.skip_with_reason(KEYSWITCH_DISABLED);
        return Ok(());
    };
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().rotate_rows(&scratch[0], 1, galois_keys)?);
    }
    Ok(())
}

pub fn rotate_cols<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    let Some(galois_keys) = env.galois_keys() else {
        state.skip_with_reason(KEYSWITCH_DISABLED);
        return Ok(());
    };
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().rotate_columns(&scratch[0], galois_keys)?);
    }
    Ok(())
}

pub fn mod_switch<B: HeBackend>(state: &mut TimingState, env: &EnvironmentBundle<B>) -> Result<()> {
    if !env.context().using_keyswitching() {
        state.skip_with_reason("modulus switching requires a multi-level modulus chain");
        return Ok(());
    }
    while state.keep_running() {
        state.pause_timing();
        refresh_scratch(env, 1);
        state.resume_timing();
        let scratch = env.scratch();
        black_box(env.evaluator().mod_switch_to_next(&scratch[0])?);
    }
    Ok(())
}
