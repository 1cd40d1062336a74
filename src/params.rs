//! Cryptographic parameter identities and the fixed benchmark catalogue.
//!
//! A [`ParameterIdentity`] is the value that fully determines an HE
//! instance's behavior and cost profile: ring dimension, ordered modulus
//! chain, scheme variant, and (for the integer scheme) the plaintext
//! modulus. Identities compare and hash structurally over all fields; the
//! environment cache is keyed by them, never by address.

use std::fmt;

use crate::backend::HeBackend;
use crate::error::{HeBenchError, Result};

/// Scheme variants covered by the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemeTag {
    /// Exact integer arithmetic (batched plaintext vectors).
    Bfv,
    /// Approximate real/complex arithmetic (scaled fixed-point encoding).
    Ckks,
}

impl fmt::Display for SchemeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeTag::Bfv => write!(f, "bfv"),
            SchemeTag::Ckks => write!(f, "ckks"),
        }
    }
}

/// Named security level targeted by the default catalogue.
///
/// Consumed by [`HeBackend::default_modulus_chain`]; the harness itself
/// attaches no meaning beyond passing it through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SecurityLevel {
    #[default]
    Tc128,
    Tc192,
    Tc256,
}

/// Ring dimensions covered by the default catalogue.
pub const DEFAULT_DEGREES: [usize; 5] = [1024, 2048, 4096, 8192, 16384];

/// Plaintext modulus shared by all integer-scheme identities in the default
/// catalogue. 2^16 + 1 supports batching for every default ring dimension.
pub const DEFAULT_PLAIN_MODULUS: u64 = 65537;

const MAX_MODULUS_BITS: u32 = 60;

/// Value type identifying one HE instance.
///
/// Two identities built independently from equal field values are the same
/// cache key. Construct through [`ParameterIdentity::bfv`] or
/// [`ParameterIdentity::ckks`], which validate the field invariants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterIdentity {
    scheme: SchemeTag,
    poly_modulus_degree: usize,
    coeff_modulus: Vec<u64>,
    plain_modulus: Option<u64>,
}

impl ParameterIdentity {
    /// Integer-scheme identity with an explicit plaintext modulus.
    pub fn bfv(poly_modulus_degree: usize, coeff_modulus: Vec<u64>, plain_modulus: u64) -> Result<Self> {
        validate(poly_modulus_degree, &coeff_modulus)?;
        if plain_modulus < 2 {
            return Err(HeBenchError::InvalidParameters(format!(
                "plain modulus {plain_modulus} is too small"
            )));
        }
        Ok(Self {
            scheme: SchemeTag::Bfv,
            poly_modulus_degree,
            coeff_modulus,
            plain_modulus: Some(plain_modulus),
        })
    }

    /// Approximate-scheme identity; carries no plaintext modulus.
    pub fn ckks(poly_modulus_degree: usize, coeff_modulus: Vec<u64>) -> Result<Self> {
        validate(poly_modulus_degree, &coeff_modulus)?;
        Ok(Self {
            scheme: SchemeTag::Ckks,
            poly_modulus_degree,
            coeff_modulus,
            plain_modulus: None,
        })
    }

    pub fn scheme(&self) -> SchemeTag {
        self.scheme
    }

    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus(&self) -> &[u64] {
        &self.coeff_modulus
    }

    pub fn plain_modulus(&self) -> Option<u64> {
        self.plain_modulus
    }
}

impl fmt::Display for ParameterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} n={} primes={}",
            self.scheme,
            self.poly_modulus_degree,
            self.coeff_modulus.len()
        )?;
        if let Some(t) = self.plain_modulus {
            write!(f, " t={t}")?;
        }
        Ok(())
    }
}

fn validate(poly_modulus_degree: usize, coeff_modulus: &[u64]) -> Result<()> {
    if poly_modulus_degree < 2 || !poly_modulus_degree.is_power_of_two() {
        return Err(HeBenchError::InvalidParameters(format!(
            "ring dimension {poly_modulus_degree} is not a power of two >= 2"
        )));
    }
    if coeff_modulus.is_empty() {
        return Err(HeBenchError::InvalidParameters(
            "modulus chain is empty".into(),
        ));
    }
    for &q in coeff_modulus {
        let bits = 64 - q.leading_zeros();
        if q < 2 || bits > MAX_MODULUS_BITS {
            return Err(HeBenchError::InvalidParameters(format!(
                "modulus {q} is outside the supported 2..=2^{MAX_MODULUS_BITS} range"
            )));
        }
        if q <= 2 * poly_modulus_degree as u64 {
            return Err(HeBenchError::InvalidParameters(format!(
                "modulus {q} is incompatible with ring dimension {poly_modulus_degree}"
            )));
        }
    }
    Ok(())
}

/// One catalogue row: a ring dimension and its modulus chain, expanded into
/// one identity per scheme variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub poly_modulus_degree: usize,
    pub coeff_modulus: Vec<u64>,
}

impl CatalogueEntry {
    pub fn bfv_identity(&self, plain_modulus: u64) -> Result<ParameterIdentity> {
        ParameterIdentity::bfv(self.poly_modulus_degree, self.coeff_modulus.clone(), plain_modulus)
    }

    pub fn ckks_identity(&self) -> Result<ParameterIdentity> {
        ParameterIdentity::ckks(self.poly_modulus_degree, self.coeff_modulus.clone())
    }
}

/// The fixed, ordered list of parameter sets to benchmark. Pure data once
/// constructed; expansion into per-scheme identities is deterministic.
#[derive(Clone, Debug)]
pub struct ParameterCatalogue {
    entries: Vec<CatalogueEntry>,
    plain_modulus: u64,
}

impl ParameterCatalogue {
    /// Catalogue over explicit entries. Every entry is validated up front so
    /// later identity expansion cannot fail on malformed rows.
    pub fn from_entries(entries: Vec<CatalogueEntry>, plain_modulus: u64) -> Result<Self> {
        for entry in &entries {
            entry.bfv_identity(plain_modulus)?;
            entry.ckks_identity()?;
        }
        Ok(Self { entries, plain_modulus })
    }

    /// Default catalogue over [`DEFAULT_DEGREES`], with modulus chains
    /// supplied by the backend for the requested security level.
    pub fn bfv_default<B: HeBackend>(level: SecurityLevel) -> Result<Self> {
        let entries = DEFAULT_DEGREES
            .iter()
            .map(|&n| CatalogueEntry {
                poly_modulus_degree: n,
                coeff_modulus: B::default_modulus_chain(n, level),
            })
            .collect();
        Self::from_entries(entries, DEFAULT_PLAIN_MODULUS)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn plain_modulus(&self) -> u64 {
        self.plain_modulus
    }

    /// All identities in catalogue order, one integer-scheme and one
    /// approximate-scheme identity per entry.
    pub fn identities(&self) -> Result<Vec<ParameterIdentity>> {
        let mut out = Vec::with_capacity(2 * self.entries.len());
        for entry in &self.entries {
            out.push(entry.bfv_identity(self.plain_modulus)?);
            out.push(entry.ckks_identity()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_rejects_non_power_of_two_degree() {
        assert!(ParameterIdentity::ckks(3000, vec![65537]).is_err());
        assert!(ParameterIdentity::ckks(0, vec![65537]).is_err());
    }

    #[test]
    fn test_rejects_empty_chain() {
        assert!(ParameterIdentity::ckks(4096, vec![]).is_err());
    }

    #[test]
    fn test_rejects_modulus_below_ring_dimension() {
        // q must exceed 2n for a negacyclic ring of dimension n.
        assert!(ParameterIdentity::ckks(4096, vec![4096]).is_err());
    }

    #[test]
    fn test_bfv_requires_plain_modulus() {
        let id = ParameterIdentity::bfv(4096, vec![1 << 36], 65537).unwrap();
        assert_eq!(id.plain_modulus(), Some(65537));
        let id = ParameterIdentity::ckks(4096, vec![1 << 36]).unwrap();
        assert_eq!(id.plain_modulus(), None);
    }

    #[test]
    fn test_structural_equality() {
        let a = ParameterIdentity::bfv(4096, vec![17592186028033, 17592186036225], 65537).unwrap();
        let b = ParameterIdentity::bfv(4096, vec![17592186028033, 17592186036225], 65537).unwrap();
        assert_eq!(a, b);
        let c = ParameterIdentity::ckks(4096, vec![17592186028033, 17592186036225]).unwrap();
        assert_ne!(a, c);
    }

    proptest! {
        // Independently allocated identities with equal fields must be the
        // same map key: equality and hashing are field-wise.
        #[test]
        fn prop_equal_fields_are_one_cache_key(
            degree_exp in 10usize..15,
            chain in proptest::collection::vec((1u64 << 21)..(1u64 << 50), 1..5),
            bfv in any::<bool>(),
        ) {
            let n = 1usize << degree_exp;
            let build = || -> ParameterIdentity {
                if bfv {
                    ParameterIdentity::bfv(n, chain.clone(), DEFAULT_PLAIN_MODULUS).unwrap()
                } else {
                    ParameterIdentity::ckks(n, chain.clone()).unwrap()
                }
            };
            let first = build();
            let second = build();
            prop_assert_eq!(&first, &second);
            let mut map = HashMap::new();
            map.insert(first, 1u32);
            prop_assert_eq!(map.get(&second), Some(&1u32));
        }
    }

    #[test]
    fn test_catalogue_expands_both_schemes_in_order() {
        let catalogue = ParameterCatalogue::from_entries(
            vec![
                CatalogueEntry { poly_modulus_degree: 4096, coeff_modulus: vec![1 << 36] },
                CatalogueEntry { poly_modulus_degree: 8192, coeff_modulus: vec![1 << 43, 1 << 44] },
            ],
            DEFAULT_PLAIN_MODULUS,
        )
        .unwrap();
        let ids = catalogue.identities().unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0].scheme(), SchemeTag::Bfv);
        assert_eq!(ids[1].scheme(), SchemeTag::Ckks);
        assert_eq!(ids[2].poly_modulus_degree(), 8192);
    }

    #[test]
    fn test_catalogue_rejects_malformed_entry() {
        let result = ParameterCatalogue::from_entries(
            vec![CatalogueEntry { poly_modulus_degree: 4096, coeff_modulus: vec![] }],
            DEFAULT_PLAIN_MODULUS,
        );
        assert!(result.is_err());
    }
}
