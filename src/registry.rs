//! Case registry: expands the catalogue into labeled, bundle-bound cases.
//!
//! For each catalogue entry the registry resolves both scheme bundles once,
//! then walks the declarative case tables in fixed display order (key
//! generation, integer scheme, approximate scheme, shared utilities) and
//! registers one case per row. Labels are a pure function of (ring
//! dimension, total modulus bit length, category, operation), so two runs
//! over the same catalogue produce identical label sequences.

use std::fmt;
use std::rc::Rc;

use crate::backend::{HeBackend, HeContext};
use crate::cases;
use crate::driver::{BenchmarkDriver, CaseFn, TimeUnit};
use crate::env::{EnvironmentBundle, EnvironmentCache};
use crate::error::Result;
use crate::params::ParameterCatalogue;

/// Display category of a benchmark case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    KeyGen,
    Bfv,
    Ckks,
    Util,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::KeyGen => "keygen",
            Category::Bfv => "bfv",
            Category::Ckks => "ckks",
            Category::Util => "util",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ring dimensions below this cannot hold key-switching material at all;
/// their key-switching cases are omitted at registration rather than
/// registered and skipped.
pub const MIN_KEYSWITCH_DEGREE: usize = 1024;

/// Deterministic, human-sortable case label.
pub fn case_label(poly_modulus_degree: usize, log_q: u32, category: Category, op: &str) -> String {
    format!("n={poly_modulus_degree} / log_q={log_q} / {category} / {op}")
}

/// One row of a case table: operation name, capability requirement, body.
struct CaseSpec<B: HeBackend> {
    op: &'static str,
    needs_keyswitching: bool,
    run: CaseFn<B>,
}

fn keygen_cases<B: HeBackend>() -> Vec<CaseSpec<B>> {
    vec![
        CaseSpec { op: "secret", needs_keyswitching: false, run: cases::keygen::secret::<B> },
        CaseSpec { op: "public", needs_keyswitching: false, run: cases::keygen::public::<B> },
        CaseSpec { op: "relin", needs_keyswitching: true, run: cases::keygen::relin::<B> },
        CaseSpec { op: "galois", needs_keyswitching: true, run: cases::keygen::galois::<B> },
    ]
}

fn bfv_cases<B: HeBackend>() -> Vec<CaseSpec<B>> {
    vec![
        CaseSpec { op: "encode_batch", needs_keyswitching: false, run: cases::bfv::encode_batch::<B> },
        CaseSpec { op: "decode_batch", needs_keyswitching: false, run: cases::bfv::decode_batch::<B> },
        CaseSpec { op: "encrypt_pk", needs_keyswitching: false, run: cases::bfv::encrypt_pk::<B> },
        CaseSpec { op: "encrypt_sk", needs_keyswitching: false, run: cases::bfv::encrypt_sk::<B> },
        CaseSpec { op: "decrypt", needs_keyswitching: false, run: cases::bfv::decrypt::<B> },
        CaseSpec { op: "add_ct", needs_keyswitching: false, run: cases::bfv::add_ct::<B> },
        CaseSpec { op: "mul_ct", needs_keyswitching: false, run: cases::bfv::mul_ct::<B> },
        CaseSpec { op: "mul_pt", needs_keyswitching: false, run: cases::bfv::mul_pt::<B> },
        CaseSpec { op: "square", needs_keyswitching: false, run: cases::bfv::square::<B> },
        CaseSpec { op: "relin", needs_keyswitching: true, run: cases::bfv::relin::<B> },
        CaseSpec { op: "rotate_rows", needs_keyswitching: true, run: cases::bfv::rotate_rows::<B> },
        CaseSpec { op: "rotate_cols", needs_keyswitching: true, run: cases::bfv::rotate_cols::<B> },
        CaseSpec { op: "mod_switch", needs_keyswitching: true, run: cases::bfv::mod_switch::<B> },
    ]
}

fn ckks_cases<B: HeBackend>() -> Vec<CaseSpec<B>> {
    vec![
        CaseSpec { op: "encode_double", needs_keyswitching: false, run: cases::ckks::encode_double::<B> },
        CaseSpec { op: "decode_double", needs_keyswitching: false, run: cases::ckks::decode_double::<B> },
        CaseSpec { op: "encrypt_pk", needs_keyswitching: false, run: cases::ckks::encrypt_pk::<B> },
        CaseSpec { op: "decrypt", needs_keyswitching: false, run: cases::ckks::decrypt::<B> },
        CaseSpec { op: "add_ct", needs_keyswitching: false, run: cases::ckks::add_ct::<B> },
        CaseSpec { op: "mul_ct", needs_keyswitching: false, run: cases::ckks::mul_ct::<B> },
        CaseSpec { op: "mul_pt", needs_keyswitching: false, run: cases::ckks::mul_pt::<B> },
        CaseSpec { op: "square", needs_keyswitching: false, run: cases::ckks::square::<B> },
        CaseSpec { op: "relin", needs_keyswitching: true, run: cases::ckks::relin::<B> },
        CaseSpec { op: "rescale", needs_keyswitching: true, run: cases::ckks::rescale::<B> },
        CaseSpec { op: "rotate_vector", needs_keyswitching: true, run: cases::ckks::rotate_vector::<B> },
    ]
}

fn util_ntt_cases<B: HeBackend>() -> Vec<CaseSpec<B>> {
    vec![
        CaseSpec { op: "ntt_fwd", needs_keyswitching: false, run: cases::util::ntt_fwd::<B> },
        CaseSpec { op: "ntt_inv", needs_keyswitching: false, run: cases::util::ntt_inv::<B> },
    ]
}

fn util_fft_cases<B: HeBackend>() -> Vec<CaseSpec<B>> {
    vec![
        CaseSpec { op: "fft_fwd", needs_keyswitching: false, run: cases::util::fft_fwd::<B> },
        CaseSpec { op: "fft_inv", needs_keyswitching: false, run: cases::util::fft_inv::<B> },
    ]
}

/// Register every case for every catalogue entry.
///
/// Bundles are resolved through the cache once per entry; the total modulus
/// bit length in the label comes from the key-level context of the
/// approximate-scheme bundle, which shares its chain with the integer-scheme
/// bundle at the same ring dimension.
pub fn register_all<B: HeBackend>(
    catalogue: &ParameterCatalogue,
    cache: &mut EnvironmentCache<B>,
    driver: &mut BenchmarkDriver<B>,
) -> Result<()> {
    for entry in catalogue.entries() {
        let n = entry.poly_modulus_degree;
        let bfv = cache.get_or_create(&entry.bfv_identity(catalogue.plain_modulus())?)?;
        let ckks = cache.get_or_create(&entry.ckks_identity()?)?;
        let log_q = ckks.context().total_modulus_bits();

        register_table(driver, n, log_q, Category::KeyGen, &keygen_cases(), &ckks)?;
        register_table(driver, n, log_q, Category::Bfv, &bfv_cases(), &bfv)?;
        register_table(driver, n, log_q, Category::Ckks, &ckks_cases(), &ckks)?;
        register_table(driver, n, log_q, Category::Util, &util_ntt_cases(), &bfv)?;
        register_table(driver, n, log_q, Category::Util, &util_fft_cases(), &ckks)?;
    }
    Ok(())
}

fn register_table<B: HeBackend>(
    driver: &mut BenchmarkDriver<B>,
    poly_modulus_degree: usize,
    log_q: u32,
    category: Category,
    table: &[CaseSpec<B>],
    bundle: &Rc<EnvironmentBundle<B>>,
) -> Result<()> {
    for spec in table {
        if spec.needs_keyswitching && poly_modulus_degree < MIN_KEYSWITCH_DEGREE {
            continue;
        }
        driver.register(
            case_label(poly_modulus_degree, log_q, category, spec.op),
            category,
            TimeUnit::Microseconds,
            Rc::clone(bundle),
            spec.run,
        )?;
    }
    Ok(())
}
