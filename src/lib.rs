//! Microbenchmark harness for lattice-based homomorphic encryption.
//!
//! The crate turns a [`params::ParameterCatalogue`] into a flat list of
//! timed benchmark cases. Expensive per-parameter-set state (keys, encoders,
//! scratch ciphertexts) is built once per distinct parameter identity by an
//! [`env::EnvironmentCache`] and shared by every case registered against it.
//! Case bodies control their own stopwatch through [`timing::TimingState`],
//! so per-iteration setup such as refreshing operand ciphertexts never
//! contributes to the reported figures.
//!
//! The HE library itself is abstracted behind the [`backend::HeBackend`]
//! trait family; [`null_backend::NullBackend`] is an instrumented stand-in
//! used by the crate's own tests and overhead benchmarks.

pub mod backend;
pub mod cases;
pub mod driver;
pub mod env;
pub mod error;
pub mod null_backend;
pub mod params;
pub mod registry;
pub mod timing;

pub use driver::{BenchmarkDriver, CaseReport, TimeUnit, DEFAULT_ITERATIONS};
pub use env::{EnvironmentBundle, EnvironmentCache};
pub use error::{HeBenchError, Result};
pub use params::{
    CatalogueEntry, ParameterCatalogue, ParameterIdentity, SchemeTag, SecurityLevel,
};
pub use registry::{case_label, register_all, Category, MIN_KEYSWITCH_DEGREE};
pub use timing::{CaseOutcome, TimingState};
