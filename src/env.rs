//! Benchmark environment bundles and the identity-keyed cache.
//!
//! Building keys for a large ring dimension dominates everything else the
//! harness does, and dozens of cases share one parameter set, so derived
//! material is constructed at most once per distinct [`ParameterIdentity`]
//! and handed out as a shared bundle. The cache is keyed by the identity
//! value itself; equality is structural over every field.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::backend::{HeBackend, HeContext};
use crate::error::{HeBenchError, Result};
use crate::params::{ParameterIdentity, SchemeTag};

/// The scheme-appropriate encoder, fixed at bundle construction by the
/// identity's scheme tag.
pub enum SchemeEncoder<B: HeBackend> {
    Batch(B::BatchEncoder),
    Ckks(B::CkksEncoder),
}

impl<B: HeBackend> SchemeEncoder<B> {
    pub fn batch(&self) -> Result<&B::BatchEncoder> {
        match self {
            SchemeEncoder::Batch(encoder) => Ok(encoder),
            SchemeEncoder::Ckks(_) => Err(HeBenchError::InvalidParameters(
                "case requires a batch encoder but the bundle is approximate-scheme".into(),
            )),
        }
    }

    pub fn ckks(&self) -> Result<&B::CkksEncoder> {
        match self {
            SchemeEncoder::Ckks(encoder) => Ok(encoder),
            SchemeEncoder::Batch(_) => Err(HeBenchError::InvalidParameters(
                "case requires a CKKS encoder but the bundle is integer-scheme".into(),
            )),
        }
    }
}

/// Precomputed material for one parameter identity: context, keys, encoder,
/// evaluator, a dedicated seeded generator and two ciphertext scratch
/// buffers.
///
/// Immutable after construction except for the generator and the scratch
/// buffers, which only the setup phase of the timing protocol may borrow.
/// No case may retain scratch contents beyond its own iteration. Bundles are
/// shared as `Rc`: the core is single-threaded, and the interior-mutable
/// scratch state is deliberately not synchronized.
pub struct EnvironmentBundle<B: HeBackend> {
    identity: ParameterIdentity,
    context: B::Context,
    secret_key: B::SecretKey,
    public_key: B::PublicKey,
    relin_keys: Option<B::RelinKeys>,
    galois_keys: Option<B::GaloisKeys>,
    encoder: SchemeEncoder<B>,
    encryptor: B::Encryptor,
    decryptor: B::Decryptor,
    evaluator: B::Evaluator,
    prng: RefCell<B::Prng>,
    scratch: RefCell<[B::Ciphertext; 2]>,
}

impl<B: HeBackend> EnvironmentBundle<B> {
    /// Build the full bundle for one identity. Key-switching material is
    /// derived only when the context's modulus chain enables it.
    fn build(identity: &ParameterIdentity) -> Result<Self> {
        let context = B::create_context(identity)?;
        let secret_key = context.generate_secret_key();
        let public_key = context.derive_public_key(&secret_key);
        let (relin_keys, galois_keys) = if context.using_keyswitching() {
            (
                Some(context.create_relin_keys(&secret_key)?),
                Some(context.create_galois_keys(&secret_key)?),
            )
        } else {
            (None, None)
        };
        let encoder = match identity.scheme() {
            SchemeTag::Bfv => SchemeEncoder::Batch(context.batch_encoder()?),
            SchemeTag::Ckks => SchemeEncoder::Ckks(context.ckks_encoder()?),
        };
        let encryptor = context.encryptor(&public_key, &secret_key);
        let decryptor = context.decryptor(&secret_key);
        let evaluator = context.evaluator();
        let prng = RefCell::new(context.seeded_prng());
        // Two independent scratch ciphertexts of two components each, enough
        // for every binary operation under measurement.
        let scratch = RefCell::new([context.allocate_ciphertext(2), context.allocate_ciphertext(2)]);
        Ok(Self {
            identity: identity.clone(),
            context,
            secret_key,
            public_key,
            relin_keys,
            galois_keys,
            encoder,
            encryptor,
            decryptor,
            evaluator,
            prng,
            scratch,
        })
    }

    pub fn identity(&self) -> &ParameterIdentity {
        &self.identity
    }

    pub fn context(&self) -> &B::Context {
        &self.context
    }

    pub fn secret_key(&self) -> &B::SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &B::PublicKey {
        &self.public_key
    }

    /// Present only when the modulus chain enables key switching.
    pub fn relin_keys(&self) -> Option<&B::RelinKeys> {
        self.relin_keys.as_ref()
    }

    /// Present only when the modulus chain enables key switching.
    pub fn galois_keys(&self) -> Option<&B::GaloisKeys> {
        self.galois_keys.as_ref()
    }

    pub fn encoder(&self) -> &SchemeEncoder<B> {
        &self.encoder
    }

    pub fn batch_encoder(&self) -> Result<&B::BatchEncoder> {
        self.encoder.batch()
    }

    pub fn ckks_encoder(&self) -> Result<&B::CkksEncoder> {
        self.encoder.ckks()
    }

    pub fn encryptor(&self) -> &B::Encryptor {
        &self.encryptor
    }

    pub fn decryptor(&self) -> &B::Decryptor {
        &self.decryptor
    }

    pub fn evaluator(&self) -> &B::Evaluator {
        &self.evaluator
    }

    /// The bundle's dedicated generator, for per-iteration setup only.
    pub fn prng_mut(&self) -> RefMut<'_, B::Prng> {
        self.prng.borrow_mut()
    }

    /// Read access to the scratch ciphertexts inside the timed window.
    pub fn scratch(&self) -> Ref<'_, [B::Ciphertext; 2]> {
        self.scratch.borrow()
    }

    /// The two scratch ciphertexts, for per-iteration setup only.
    pub fn scratch_mut(&self) -> RefMut<'_, [B::Ciphertext; 2]> {
        self.scratch.borrow_mut()
    }
}

/// Identity-keyed bundle cache; the primary, eager-friendly mode.
///
/// [`EnvironmentCache::populate`] is the construction path: it builds every
/// identity of a catalogue up front and rejects structurally-equal
/// duplicates as a fatal configuration error.
/// [`EnvironmentCache::get_or_create`] is the lookup path: it builds lazily
/// on first request and afterwards returns the pointer-identical bundle, so
/// key generation runs at most once per identity no matter how many cases
/// reference it.
pub struct EnvironmentCache<B: HeBackend> {
    bundles: HashMap<ParameterIdentity, Rc<EnvironmentBundle<B>>>,
}

impl<B: HeBackend> EnvironmentCache<B> {
    pub fn new() -> Self {
        Self { bundles: HashMap::new() }
    }

    /// Eagerly construct bundles for every identity, in order. A duplicate
    /// identity in the list means the catalogue is ambiguous; nothing is
    /// overwritten and the error must abort the run.
    pub fn populate(&mut self, identities: &[ParameterIdentity]) -> Result<()> {
        for identity in identities {
            self.insert_new(identity)?;
        }
        Ok(())
    }

    /// Return the bundle for `identity`, constructing it on first request.
    pub fn get_or_create(&mut self, identity: &ParameterIdentity) -> Result<Rc<EnvironmentBundle<B>>> {
        if let Some(bundle) = self.bundles.get(identity) {
            return Ok(Rc::clone(bundle));
        }
        self.insert_new(identity)
    }

    /// Lookup without construction.
    pub fn get(&self, identity: &ParameterIdentity) -> Option<Rc<EnvironmentBundle<B>>> {
        self.bundles.get(identity).map(Rc::clone)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    fn insert_new(&mut self, identity: &ParameterIdentity) -> Result<Rc<EnvironmentBundle<B>>> {
        if self.bundles.contains_key(identity) {
            return Err(HeBenchError::DuplicateIdentity(identity.to_string()));
        }
        let bundle = Rc::new(EnvironmentBundle::build(identity)?);
        self.bundles.insert(identity.clone(), Rc::clone(&bundle));
        Ok(bundle)
    }
}

impl<B: HeBackend> Default for EnvironmentCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Alternate "reinitialize on demand" mode: one bundle alive at a time.
///
/// Requesting the structurally-equal current identity returns the existing
/// bundle; requesting a different identity drops it and rebuilds. Trades
/// repeated key generation for a one-bundle memory footprint. Not
/// interchangeable with [`EnvironmentCache`] under concurrent access; pick
/// one mode per deployment.
pub struct SingleSlotCache<B: HeBackend> {
    slot: Option<Rc<EnvironmentBundle<B>>>,
}

impl<B: HeBackend> SingleSlotCache<B> {
    pub fn new() -> Self {
        Self { slot: None }
    }

    pub fn current(&mut self, identity: &ParameterIdentity) -> Result<Rc<EnvironmentBundle<B>>> {
        if let Some(bundle) = &self.slot {
            if bundle.identity() == identity {
                return Ok(Rc::clone(bundle));
            }
        }
        let bundle = Rc::new(EnvironmentBundle::build(identity)?);
        self.slot = Some(Rc::clone(&bundle));
        Ok(bundle)
    }
}

impl<B: HeBackend> Default for SingleSlotCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_backend::NullBackend;
    use std::sync::atomic::Ordering;

    fn bfv_id(n: usize) -> ParameterIdentity {
        ParameterIdentity::bfv(n, vec![(1 << 36) + 1, (1 << 36) + 3, (1 << 37) + 1], 65537).unwrap()
    }

    #[test]
    fn test_lookup_path_builds_once() {
        let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
        let id = bfv_id(4096);
        let first = cache.get_or_create(&id).unwrap();
        for _ in 0..5 {
            let again = cache.get_or_create(&id).unwrap();
            assert!(Rc::ptr_eq(&first, &again));
        }
        assert_eq!(cache.len(), 1);
        // Key generation ran exactly once across all lookups.
        assert_eq!(first.context().counters().secret_keys.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_independently_built_identity_hits_cache() {
        let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
        let first = cache.get_or_create(&bfv_id(4096)).unwrap();
        let second = cache.get_or_create(&bfv_id(4096)).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_construction_path_rejects_duplicates() {
        let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
        let id = bfv_id(4096);
        let err = cache.populate(&[id.clone(), id]).unwrap_err();
        assert!(matches!(err, HeBenchError::DuplicateIdentity(_)));
    }

    #[test]
    fn test_keyswitching_material_gated_by_chain() {
        let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
        let multi = cache.get_or_create(&bfv_id(4096)).unwrap();
        assert!(multi.relin_keys().is_some());
        assert!(multi.galois_keys().is_some());

        let single = cache
            .get_or_create(&ParameterIdentity::bfv(1024, vec![(1 << 27) + 1], 65537).unwrap())
            .unwrap();
        assert!(single.relin_keys().is_none());
        assert!(single.galois_keys().is_none());
    }

    #[test]
    fn test_encoder_variant_follows_scheme() {
        let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
        let bfv = cache.get_or_create(&bfv_id(4096)).unwrap();
        assert!(bfv.batch_encoder().is_ok());
        assert!(bfv.ckks_encoder().is_err());

        let ckks = cache
            .get_or_create(&ParameterIdentity::ckks(4096, vec![(1 << 36) + 1]).unwrap())
            .unwrap();
        assert!(ckks.ckks_encoder().is_ok());
        assert!(ckks.batch_encoder().is_err());
    }

    #[test]
    fn test_single_slot_reinitializes_on_different_identity() {
        let mut cache: SingleSlotCache<NullBackend> = SingleSlotCache::new();
        let id_a = bfv_id(4096);
        let first = cache.current(&id_a).unwrap();
        let again = cache.current(&id_a).unwrap();
        assert!(Rc::ptr_eq(&first, &again));

        let id_b = ParameterIdentity::ckks(4096, vec![(1 << 36) + 1]).unwrap();
        let other = cache.current(&id_b).unwrap();
        assert!(!Rc::ptr_eq(&first, &other));
        assert_eq!(other.identity(), &id_b);

        // Coming back rebuilds; the single slot never holds two bundles.
        let back = cache.current(&id_a).unwrap();
        assert!(!Rc::ptr_eq(&first, &back));
        assert_eq!(back.context().counters().secret_keys.load(Ordering::Relaxed), 1);
    }
}
