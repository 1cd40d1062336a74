//! Structure-faithful stand-in backend.
//!
//! `NullBackend` is not a cryptographic implementation: its objects have the
//! right shapes and costs proportional to the ring parameters (coefficient
//! vectors sized `n * chain_len`, coefficient-wise modular arithmetic), and
//! every capability carries an instrumentation counter. It exists so the
//! harness core can be tested and its own overhead calibrated without a real
//! HE library. Default modulus chains are NTT-shaped placeholder values,
//! `q == 1 (mod 2n)` with the tabulated bit lengths, not primes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::backend::{
    BatchEncode, CkksEncode, Decrypt, Encrypt, Evaluate, HeBackend, HeContext, SamplePoly,
};
use crate::error::{HeBenchError, Result};
use crate::params::{ParameterIdentity, SchemeTag, SecurityLevel};

/// Invocation counters shared by every object derived from one context.
#[derive(Debug, Default)]
pub struct Counters {
    pub secret_keys: AtomicU64,
    pub public_keys: AtomicU64,
    pub relin_keys: AtomicU64,
    pub galois_keys: AtomicU64,
    pub uniform_samples: AtomicU64,
    pub multiplies: AtomicU64,
    pub relinearizations: AtomicU64,
    pub rotations: AtomicU64,
    /// Artificial delay applied to every uniform sample, in microseconds.
    /// Lets tests make setup arbitrarily slow to prove it is not measured.
    pub sample_delay_micros: AtomicU64,
}

pub struct NullBackend;

pub struct NullContext {
    identity: ParameterIdentity,
    counters: Arc<Counters>,
}

impl NullContext {
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    fn coeff_count(&self) -> usize {
        self.identity.poly_modulus_degree() * self.identity.coeff_modulus().len()
    }

    fn q0(&self) -> u64 {
        self.identity.coeff_modulus()[0]
    }
}

pub struct NullSecretKey {
    coeffs: Vec<u64>,
}

pub struct NullPublicKey {
    parts: [Vec<u64>; 2],
}

pub struct NullRelinKeys {
    columns: Vec<Vec<u64>>,
}

pub struct NullGaloisKeys {
    columns: Vec<Vec<u64>>,
}

#[derive(Clone, Debug)]
pub struct NullPlaintext {
    coeffs: Vec<u64>,
    scale: f64,
}

#[derive(Clone, Debug)]
pub struct NullCiphertext {
    components: Vec<Vec<u64>>,
}

pub struct NullBatchEncoder {
    slots: usize,
    plain_modulus: u64,
}

pub struct NullCkksEncoder {
    slots: usize,
}

pub struct NullEncryptor {
    mask: Vec<u64>,
    q0: u64,
}

pub struct NullDecryptor {
    plain_len: usize,
}

pub struct NullEvaluator {
    q0: u64,
    counters: Arc<Counters>,
}

pub struct NullPrng {
    rng: ChaCha20Rng,
    counters: Arc<Counters>,
}

impl HeBackend for NullBackend {
    type Context = NullContext;
    type SecretKey = NullSecretKey;
    type PublicKey = NullPublicKey;
    type RelinKeys = NullRelinKeys;
    type GaloisKeys = NullGaloisKeys;
    type Plaintext = NullPlaintext;
    type Ciphertext = NullCiphertext;
    type BatchEncoder = NullBatchEncoder;
    type CkksEncoder = NullCkksEncoder;
    type Encryptor = NullEncryptor;
    type Decryptor = NullDecryptor;
    type Evaluator = NullEvaluator;
    type Prng = NullPrng;

    fn create_context(identity: &ParameterIdentity) -> Result<NullContext> {
        Ok(NullContext {
            identity: identity.clone(),
            counters: Arc::new(Counters::default()),
        })
    }

    fn default_modulus_chain(poly_modulus_degree: usize, level: SecurityLevel) -> Vec<u64> {
        let bits = default_chain_bits(poly_modulus_degree);
        // Higher security at the same ring dimension means a shorter chain.
        let keep = match level {
            SecurityLevel::Tc128 => bits.len(),
            SecurityLevel::Tc192 => (2 * bits.len() + 2) / 3,
            SecurityLevel::Tc256 => (bits.len() + 1) / 2,
        }
        .max(1);
        bits[..keep]
            .iter()
            .enumerate()
            .map(|(index, &b)| synth_modulus(b, index as u64, poly_modulus_degree))
            .collect()
    }
}

fn default_chain_bits(poly_modulus_degree: usize) -> &'static [u32] {
    match poly_modulus_degree {
        1024 => &[27],
        2048 => &[54],
        4096 => &[36, 36, 37],
        8192 => &[43, 43, 44, 44, 44],
        16384 => &[48, 48, 48, 49, 49, 49, 49],
        32768 => &[56, 56, 56, 56, 57, 57, 57, 57, 57],
        _ => &[27],
    }
}

/// A value with the requested bit length satisfying `q == 1 (mod 2n)`;
/// distinct per `index` so repeated bit sizes in a chain stay distinct.
fn synth_modulus(bits: u32, index: u64, poly_modulus_degree: usize) -> u64 {
    let step = 2 * poly_modulus_degree as u64;
    let base = 1u64 << (bits - 1);
    base - base % step + (index + 1) * step + 1
}

impl HeContext<NullBackend> for NullContext {
    fn generate_secret_key(&self) -> NullSecretKey {
        self.counters.secret_keys.fetch_add(1, Ordering::Relaxed);
        let q = self.q0();
        let mut rng = rand::thread_rng();
        let coeffs = (0..self.coeff_count())
            .map(|_| match rng.gen_range(0u8..3) {
                0 => 0,
                1 => 1,
                _ => q - 1,
            })
            .collect();
        NullSecretKey { coeffs }
    }

    fn derive_public_key(&self, secret_key: &NullSecretKey) -> NullPublicKey {
        self.counters.public_keys.fetch_add(1, Ordering::Relaxed);
        let q = self.q0();
        let mut rng = rand::thread_rng();
        let a: Vec<u64> = (0..self.coeff_count()).map(|_| rng.gen_range(0..q)).collect();
        let b: Vec<u64> = a
            .iter()
            .zip(&secret_key.coeffs)
            .map(|(&a_i, &s_i)| mul_mod(a_i, s_i, q))
            .collect();
        NullPublicKey { parts: [b, a] }
    }

    fn create_relin_keys(&self, secret_key: &NullSecretKey) -> Result<NullRelinKeys> {
        if !self.using_keyswitching() {
            return Err(HeBenchError::Backend(
                "key switching is disabled for this parameter set".into(),
            ));
        }
        self.counters.relin_keys.fetch_add(1, Ordering::Relaxed);
        let columns = self.keyswitch_columns(secret_key, self.identity.coeff_modulus().len() - 1);
        Ok(NullRelinKeys { columns })
    }

    fn create_galois_keys(&self, secret_key: &NullSecretKey) -> Result<NullGaloisKeys> {
        if !self.using_keyswitching() {
            return Err(HeBenchError::Backend(
                "key switching is disabled for this parameter set".into(),
            ));
        }
        self.counters.galois_keys.fetch_add(1, Ordering::Relaxed);
        // One column per rotation element; the full set covers every
        // power-of-two step in both directions plus the column swap.
        let elements = 2 * self.identity.poly_modulus_degree().trailing_zeros() as usize + 1;
        let columns = self.keyswitch_columns(secret_key, elements);
        Ok(NullGaloisKeys { columns })
    }

    fn batch_encoder(&self) -> Result<NullBatchEncoder> {
        match (self.identity.scheme(), self.identity.plain_modulus()) {
            (SchemeTag::Bfv, Some(plain_modulus)) => Ok(NullBatchEncoder {
                slots: self.identity.poly_modulus_degree(),
                plain_modulus,
            }),
            _ => Err(HeBenchError::Backend(
                "batch encoding requires the integer scheme".into(),
            )),
        }
    }

    fn ckks_encoder(&self) -> Result<NullCkksEncoder> {
        match self.identity.scheme() {
            SchemeTag::Ckks => Ok(NullCkksEncoder {
                slots: self.identity.poly_modulus_degree() / 2,
            }),
            SchemeTag::Bfv => Err(HeBenchError::Backend(
                "CKKS encoding requires the approximate scheme".into(),
            )),
        }
    }

    fn encryptor(&self, public_key: &NullPublicKey, _secret_key: &NullSecretKey) -> NullEncryptor {
        NullEncryptor {
            mask: public_key.parts[1].clone(),
            q0: self.q0(),
        }
    }

    fn decryptor(&self, _secret_key: &NullSecretKey) -> NullDecryptor {
        NullDecryptor {
            plain_len: self.identity.poly_modulus_degree(),
        }
    }

    fn evaluator(&self) -> NullEvaluator {
        NullEvaluator {
            q0: self.q0(),
            counters: Arc::clone(&self.counters),
        }
    }

    fn seeded_prng(&self) -> NullPrng {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        NullPrng {
            rng: ChaCha20Rng::from_seed(seed),
            counters: Arc::clone(&self.counters),
        }
    }

    fn allocate_ciphertext(&self, components: usize) -> NullCiphertext {
        NullCiphertext {
            components: vec![vec![0; self.coeff_count()]; components],
        }
    }

    fn using_keyswitching(&self) -> bool {
        self.identity.coeff_modulus().len() > 1
    }

    fn total_modulus_bits(&self) -> u32 {
        self.identity
            .coeff_modulus()
            .iter()
            .map(|&q| 64 - q.leading_zeros())
            .sum()
    }

    fn poly_modulus_degree(&self) -> usize {
        self.identity.poly_modulus_degree()
    }
}

impl NullContext {
    fn keyswitch_columns(&self, secret_key: &NullSecretKey, count: usize) -> Vec<Vec<u64>> {
        let q = self.q0();
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                secret_key
                    .coeffs
                    .iter()
                    .map(|&s| add_mod(mul_mod(s, s, q), rng.gen_range(0..q), q))
                    .collect()
            })
            .collect()
    }
}

impl BatchEncode<NullBackend> for NullBatchEncoder {
    fn encode(&self, values: &[u64]) -> Result<NullPlaintext> {
        if values.len() > self.slots {
            return Err(HeBenchError::Backend(format!(
                "{} values exceed {} batching slots",
                values.len(),
                self.slots
            )));
        }
        let mut coeffs = vec![0u64; self.slots];
        for (coeff, &value) in coeffs.iter_mut().zip(values) {
            *coeff = value % self.plain_modulus;
        }
        Ok(NullPlaintext { coeffs, scale: 1.0 })
    }

    fn decode(&self, plain: &NullPlaintext) -> Result<Vec<u64>> {
        Ok(plain.coeffs.iter().map(|&c| c % self.plain_modulus).collect())
    }
}

impl CkksEncode<NullBackend> for NullCkksEncoder {
    fn encode(&self, values: &[f64], scale: f64) -> Result<NullPlaintext> {
        if values.len() > self.slots {
            return Err(HeBenchError::Backend(format!(
                "{} values exceed {} slots",
                values.len(),
                self.slots
            )));
        }
        let mut coeffs = vec![0u64; 2 * self.slots];
        for (coeff, &value) in coeffs.iter_mut().zip(values) {
            *coeff = (value * scale).abs() as u64;
        }
        Ok(NullPlaintext { coeffs, scale })
    }

    fn decode(&self, plain: &NullPlaintext) -> Result<Vec<f64>> {
        Ok(plain
            .coeffs
            .iter()
            .take(self.slots)
            .map(|&c| c as f64 / plain.scale)
            .collect())
    }
}

impl Encrypt<NullBackend> for NullEncryptor {
    fn encrypt(&self, plain: &NullPlaintext) -> Result<NullCiphertext> {
        let mut rng = rand::thread_rng();
        let offset = rng.gen_range(0..self.mask.len().max(1));
        let c1: Vec<u64> = (0..self.mask.len())
            .map(|i| self.mask[(i + offset) % self.mask.len()])
            .collect();
        let c0: Vec<u64> = (0..self.mask.len())
            .map(|i| {
                let m = plain.coeffs[i % plain.coeffs.len()];
                add_mod(m % self.q0, rng.gen_range(0..8), self.q0)
            })
            .collect();
        Ok(NullCiphertext { components: vec![c0, c1] })
    }

    fn encrypt_symmetric(&self, plain: &NullPlaintext) -> Result<NullCiphertext> {
        self.encrypt(plain)
    }
}

impl Decrypt<NullBackend> for NullDecryptor {
    fn decrypt(&self, ciphertext: &NullCiphertext) -> Result<NullPlaintext> {
        let first = ciphertext
            .components
            .first()
            .ok_or_else(|| HeBenchError::Backend("ciphertext has no components".into()))?;
        Ok(NullPlaintext {
            coeffs: first.iter().take(self.plain_len).copied().collect(),
            scale: 1.0,
        })
    }
}

impl NullEvaluator {
    /// Coefficient-wise convolution over components, the cost shape of a
    /// ciphertext-ciphertext product.
    fn convolve(&self, a: &NullCiphertext, b: &NullCiphertext) -> NullCiphertext {
        let out_len = a.components.len() + b.components.len() - 1;
        let mut components = vec![Vec::new(); out_len];
        for (i, ca) in a.components.iter().enumerate() {
            for (j, cb) in b.components.iter().enumerate() {
                let out = &mut components[i + j];
                if out.is_empty() {
                    out.resize(ca.len().min(cb.len()), 0);
                }
                for (k, slot) in out.iter_mut().enumerate() {
                    *slot = add_mod(*slot, mul_mod(ca[k], cb[k], self.q0), self.q0);
                }
            }
        }
        NullCiphertext { components }
    }

    fn map_coeffs(&self, a: &NullCiphertext, f: impl Fn(u64, usize) -> u64) -> NullCiphertext {
        NullCiphertext {
            components: a
                .components
                .iter()
                .map(|poly| poly.iter().enumerate().map(|(i, &c)| f(c, i)).collect())
                .collect(),
        }
    }
}

impl Evaluate<NullBackend> for NullEvaluator {
    fn add(&self, a: &NullCiphertext, b: &NullCiphertext) -> Result<NullCiphertext> {
        let components = a
            .components
            .iter()
            .zip(&b.components)
            .map(|(ca, cb)| {
                ca.iter()
                    .zip(cb)
                    .map(|(&x, &y)| add_mod(x, y, self.q0))
                    .collect()
            })
            .collect();
        Ok(NullCiphertext { components })
    }

    fn multiply(&self, a: &NullCiphertext, b: &NullCiphertext) -> Result<NullCiphertext> {
        self.counters.multiplies.fetch_add(1, Ordering::Relaxed);
        Ok(self.convolve(a, b))
    }

    fn multiply_plain(&self, a: &NullCiphertext, plain: &NullPlaintext) -> Result<NullCiphertext> {
        if plain.coeffs.is_empty() {
            return Err(HeBenchError::Backend("empty plaintext".into()));
        }
        Ok(self.map_coeffs(a, |c, i| mul_mod(c, plain.coeffs[i % plain.coeffs.len()] % self.q0, self.q0)))
    }

    fn square(&self, a: &NullCiphertext) -> Result<NullCiphertext> {
        Ok(self.convolve(a, a))
    }

    fn relinearize(&self, a: &NullCiphertext, relin_keys: &NullRelinKeys) -> Result<NullCiphertext> {
        self.counters.relinearizations.fetch_add(1, Ordering::Relaxed);
        let mut components: Vec<Vec<u64>> = a.components.iter().take(2).cloned().collect();
        if let (Some(extra), Some(column)) = (a.components.get(2), relin_keys.columns.first()) {
            if let Some(first) = components.first_mut() {
                for (k, slot) in first.iter_mut().enumerate() {
                    let key = column[k % column.len()];
                    *slot = add_mod(*slot, mul_mod(extra[k % extra.len()], key, self.q0), self.q0);
                }
            }
        }
        Ok(NullCiphertext { components })
    }

    fn mod_switch_to_next(&self, a: &NullCiphertext) -> Result<NullCiphertext> {
        Ok(self.map_coeffs(a, |c, _| c >> 1))
    }

    fn rescale_to_next(&self, a: &NullCiphertext) -> Result<NullCiphertext> {
        Ok(self.map_coeffs(a, |c, _| c >> 1))
    }

    fn rotate_rows(&self, a: &NullCiphertext, steps: i32, galois_keys: &NullGaloisKeys) -> Result<NullCiphertext> {
        self.counters.rotations.fetch_add(1, Ordering::Relaxed);
        debug_assert!(!galois_keys.columns.is_empty());
        let components = a
            .components
            .iter()
            .map(|poly| {
                let mut rotated = poly.clone();
                if !rotated.is_empty() {
                    let mid = steps.rem_euclid(rotated.len() as i32) as usize;
                    rotated.rotate_left(mid);
                }
                rotated
            })
            .collect();
        Ok(NullCiphertext { components })
    }

    fn rotate_columns(&self, a: &NullCiphertext, galois_keys: &NullGaloisKeys) -> Result<NullCiphertext> {
        let half = a.components.first().map_or(0, |poly| poly.len() / 2) as i32;
        self.rotate_rows(a, half, galois_keys)
    }

    fn rotate_vector(&self, a: &NullCiphertext, steps: i32, galois_keys: &NullGaloisKeys) -> Result<NullCiphertext> {
        self.rotate_rows(a, steps, galois_keys)
    }

    fn transform_to_ntt(&self, a: &NullCiphertext) -> Result<NullCiphertext> {
        Ok(self.map_coeffs(a, |c, i| add_mod(c % self.q0, i as u64 % self.q0, self.q0)))
    }

    fn transform_from_ntt(&self, a: &NullCiphertext) -> Result<NullCiphertext> {
        Ok(self.map_coeffs(a, |c, i| {
            let shift = i as u64 % self.q0;
            add_mod(c % self.q0, self.q0 - shift, self.q0)
        }))
    }
}

impl SamplePoly<NullBackend> for NullPrng {
    fn sample_uniform(&mut self, context: &NullContext, ciphertext: &mut NullCiphertext, component: usize) {
        let delay = self.counters.sample_delay_micros.load(Ordering::Relaxed);
        if delay > 0 {
            std::thread::sleep(Duration::from_micros(delay));
        }
        self.counters.uniform_samples.fetch_add(1, Ordering::Relaxed);
        let q = context.q0();
        let coeff_count = context.coeff_count();
        if ciphertext.components.len() <= component {
            ciphertext.components.resize(component + 1, vec![0; coeff_count]);
        }
        let poly = &mut ciphertext.components[component];
        poly.resize(coeff_count, 0);
        for coeff in poly.iter_mut() {
            *coeff = self.rng.gen_range(0..q);
        }
    }
}

fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 + b as u128) % q as u128) as u64
}

fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_bit_lengths() {
        for (&n, total) in [1024usize, 2048, 4096, 8192, 16384].iter().zip([27u32, 54, 109, 218, 340]) {
            let chain = NullBackend::default_modulus_chain(n, SecurityLevel::Tc128);
            let bits: u32 = chain.iter().map(|&q| 64 - q.leading_zeros()).sum();
            assert_eq!(bits, total, "n={n}");
        }
    }

    #[test]
    fn test_synth_modulus_is_ntt_shaped() {
        for (bits, n) in [(27u32, 1024usize), (36, 4096), (49, 16384)] {
            for index in 0..3 {
                let q = synth_modulus(bits, index, n);
                assert_eq!(q % (2 * n as u64), 1);
                assert_eq!(64 - q.leading_zeros(), bits);
            }
        }
    }

    #[test]
    fn test_higher_level_means_shorter_chain() {
        let tc128 = NullBackend::default_modulus_chain(16384, SecurityLevel::Tc128);
        let tc192 = NullBackend::default_modulus_chain(16384, SecurityLevel::Tc192);
        let tc256 = NullBackend::default_modulus_chain(16384, SecurityLevel::Tc256);
        assert!(tc192.len() < tc128.len());
        assert!(tc256.len() <= tc192.len());
        assert!(!tc256.is_empty());
    }

    #[test]
    fn test_keyswitching_follows_chain_length() {
        let single = NullBackend::create_context(
            &ParameterIdentity::ckks(1024, vec![(1 << 27) + 1]).unwrap(),
        )
        .unwrap();
        assert!(!single.using_keyswitching());

        let multi = NullBackend::create_context(
            &ParameterIdentity::ckks(4096, vec![(1 << 36) + 1, (1 << 37) + 1]).unwrap(),
        )
        .unwrap();
        assert!(multi.using_keyswitching());
    }

    #[test]
    fn test_relin_keys_refused_without_keyswitching() {
        let context = NullBackend::create_context(
            &ParameterIdentity::ckks(1024, vec![(1 << 27) + 1]).unwrap(),
        )
        .unwrap();
        let secret_key = context.generate_secret_key();
        assert!(context.create_relin_keys(&secret_key).is_err());
        assert!(context.create_galois_keys(&secret_key).is_err());
    }

    #[test]
    fn test_batch_roundtrip_mod_t() {
        let context = NullBackend::create_context(
            &ParameterIdentity::bfv(1024, vec![(1 << 27) + 1], 65537).unwrap(),
        )
        .unwrap();
        let encoder = context.batch_encoder().unwrap();
        let values: Vec<u64> = (0..1024).collect();
        let decoded = encoder.decode(&encoder.encode(&values).unwrap()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_rotate_rows_cycles_coefficients() {
        let context = NullBackend::create_context(
            &ParameterIdentity::bfv(1024, vec![(1 << 27) + 1, (1 << 27) + 3], 65537).unwrap(),
        )
        .unwrap();
        let secret_key = context.generate_secret_key();
        let galois_keys = context.create_galois_keys(&secret_key).unwrap();
        let evaluator = context.evaluator();
        let mut prng = context.seeded_prng();
        let mut ct = context.allocate_ciphertext(2);
        prng.sample_uniform(&context, &mut ct, 0);
        prng.sample_uniform(&context, &mut ct, 1);

        let rotated = evaluator.rotate_rows(&ct, 3, &galois_keys).unwrap();
        let mut expected = ct.components[0].clone();
        expected.rotate_left(3);
        assert_eq!(rotated.components[0], expected);

        // Negative steps wrap instead of panicking.
        let back = evaluator.rotate_rows(&rotated, -3, &galois_keys).unwrap();
        assert_eq!(back.components[0], ct.components[0]);
        assert_eq!(context.counters().rotations.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_multiply_grows_components_and_counts() {
        let context = NullBackend::create_context(
            &ParameterIdentity::bfv(1024, vec![(1 << 27) + 1], 65537).unwrap(),
        )
        .unwrap();
        let evaluator = context.evaluator();
        let mut prng = context.seeded_prng();
        let mut a = context.allocate_ciphertext(2);
        let mut b = context.allocate_ciphertext(2);
        for component in 0..2 {
            prng.sample_uniform(&context, &mut a, component);
            prng.sample_uniform(&context, &mut b, component);
        }
        let product = evaluator.multiply(&a, &b).unwrap();
        assert_eq!(product.components.len(), 3);
        assert_eq!(context.counters().multiplies.load(Ordering::Relaxed), 1);
        assert_eq!(context.counters().uniform_samples.load(Ordering::Relaxed), 4);
    }
}
