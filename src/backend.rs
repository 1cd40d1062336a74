//! Interface to the homomorphic-encryption library under benchmark.
//!
//! The harness never implements HE algorithms; it only sequences calls to a
//! backend and times a subset of them. A backend is a plug type implementing
//! [`HeBackend`], whose associated types carry the library's own key,
//! ciphertext, encoder and evaluator objects. Capabilities hang off those
//! objects as small traits so that case bodies read the way application code
//! against the real library would.

use crate::error::Result;
use crate::params::{ParameterIdentity, SecurityLevel};

/// An HE library plugged into the harness.
pub trait HeBackend: Sized + 'static {
    type Context: HeContext<Self>;
    type SecretKey;
    type PublicKey;
    type RelinKeys;
    type GaloisKeys;
    type Plaintext;
    type Ciphertext;
    type BatchEncoder: BatchEncode<Self>;
    type CkksEncoder: CkksEncode<Self>;
    type Encryptor: Encrypt<Self>;
    type Decryptor: Decrypt<Self>;
    type Evaluator: Evaluate<Self>;
    type Prng: SamplePoly<Self>;

    /// Derive a consistency-checked context from a parameter identity.
    /// Malformed identities surface here as
    /// [`crate::error::HeBenchError::InvalidParameters`].
    fn create_context(identity: &ParameterIdentity) -> Result<Self::Context>;

    /// The library's default modulus chain for a ring dimension at a named
    /// security level; consumed by the default catalogue.
    fn default_modulus_chain(poly_modulus_degree: usize, level: SecurityLevel) -> Vec<u64>;
}

/// Capabilities of a constructed cryptographic context.
pub trait HeContext<B: HeBackend> {
    fn generate_secret_key(&self) -> B::SecretKey;

    fn derive_public_key(&self, secret_key: &B::SecretKey) -> B::PublicKey;

    /// Fails when the modulus chain does not enable key switching.
    fn create_relin_keys(&self, secret_key: &B::SecretKey) -> Result<B::RelinKeys>;

    /// Full rotation key set; fails when key switching is disabled.
    fn create_galois_keys(&self, secret_key: &B::SecretKey) -> Result<B::GaloisKeys>;

    /// Integer-scheme encoder; fails for approximate-scheme contexts.
    fn batch_encoder(&self) -> Result<B::BatchEncoder>;

    /// Approximate-scheme encoder; fails for integer-scheme contexts.
    fn ckks_encoder(&self) -> Result<B::CkksEncoder>;

    fn encryptor(&self, public_key: &B::PublicKey, secret_key: &B::SecretKey) -> B::Encryptor;

    fn decryptor(&self, secret_key: &B::SecretKey) -> B::Decryptor;

    fn evaluator(&self) -> B::Evaluator;

    /// A dedicated generator seeded once from the context's randomness
    /// source; the bundle keeps it for its whole lifetime.
    fn seeded_prng(&self) -> B::Prng;

    /// A zeroed ciphertext sized to this context with the given number of
    /// polynomial components.
    fn allocate_ciphertext(&self, components: usize) -> B::Ciphertext;

    /// Whether the modulus chain carries the auxiliary prime required for
    /// relinearization and rotation. A property of the chain, not of the
    /// scheme variant.
    fn using_keyswitching(&self) -> bool;

    /// Total bit length of the key-level modulus chain.
    fn total_modulus_bits(&self) -> u32;

    fn poly_modulus_degree(&self) -> usize;
}

pub trait BatchEncode<B: HeBackend> {
    fn encode(&self, values: &[u64]) -> Result<B::Plaintext>;
    fn decode(&self, plain: &B::Plaintext) -> Result<Vec<u64>>;
}

pub trait CkksEncode<B: HeBackend> {
    fn encode(&self, values: &[f64], scale: f64) -> Result<B::Plaintext>;
    fn decode(&self, plain: &B::Plaintext) -> Result<Vec<f64>>;
}

pub trait Encrypt<B: HeBackend> {
    fn encrypt(&self, plain: &B::Plaintext) -> Result<B::Ciphertext>;
    fn encrypt_symmetric(&self, plain: &B::Plaintext) -> Result<B::Ciphertext>;
}

pub trait Decrypt<B: HeBackend> {
    fn decrypt(&self, ciphertext: &B::Ciphertext) -> Result<B::Plaintext>;
}

/// Homomorphic evaluation primitives under measurement.
pub trait Evaluate<B: HeBackend> {
    fn add(&self, a: &B::Ciphertext, b: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn multiply(&self, a: &B::Ciphertext, b: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn multiply_plain(&self, a: &B::Ciphertext, plain: &B::Plaintext) -> Result<B::Ciphertext>;

    fn square(&self, a: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn relinearize(&self, a: &B::Ciphertext, relin_keys: &B::RelinKeys) -> Result<B::Ciphertext>;

    fn mod_switch_to_next(&self, a: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn rescale_to_next(&self, a: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn rotate_rows(&self, a: &B::Ciphertext, steps: i32, galois_keys: &B::GaloisKeys) -> Result<B::Ciphertext>;

    fn rotate_columns(&self, a: &B::Ciphertext, galois_keys: &B::GaloisKeys) -> Result<B::Ciphertext>;

    fn rotate_vector(&self, a: &B::Ciphertext, steps: i32, galois_keys: &B::GaloisKeys) -> Result<B::Ciphertext>;

    fn transform_to_ntt(&self, a: &B::Ciphertext) -> Result<B::Ciphertext>;

    fn transform_from_ntt(&self, a: &B::Ciphertext) -> Result<B::Ciphertext>;
}

/// Uniform sampling of fresh polynomial components into preallocated
/// ciphertext scratch, used by per-iteration setup outside the timed window.
pub trait SamplePoly<B: HeBackend> {
    fn sample_uniform(&mut self, context: &B::Context, ciphertext: &mut B::Ciphertext, component: usize);
}
