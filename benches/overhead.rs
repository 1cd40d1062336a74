//! Harness self-overhead: cost of the timing protocol itself, measured
//! against the instrumented stand-in backend so no real HE library is
//! involved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hebench::driver::BenchmarkDriver;
use hebench::env::EnvironmentCache;
use hebench::null_backend::NullBackend;
use hebench::params::{CatalogueEntry, ParameterCatalogue, DEFAULT_PLAIN_MODULUS};
use hebench::registry::register_all;
use hebench::timing::TimingState;

fn bench_keep_running_loop(c: &mut Criterion) {
    c.bench_function("timing/keep_running_empty_100", |b| {
        b.iter(|| {
            let mut state = TimingState::new(100);
            while state.keep_running() {}
            black_box(state.finish())
        })
    });
}

fn bench_pause_resume(c: &mut Criterion) {
    c.bench_function("timing/pause_resume_pair", |b| {
        b.iter(|| {
            let mut state = TimingState::new(1);
            while state.keep_running() {
                state.pause_timing();
                state.resume_timing();
            }
            black_box(state.finish())
        })
    });
}

fn bench_driver_end_to_end(c: &mut Criterion) {
    let catalogue = ParameterCatalogue::from_entries(
        vec![CatalogueEntry {
            poly_modulus_degree: 1024,
            coeff_modulus: vec![(1 << 27) + 1],
        }],
        DEFAULT_PLAIN_MODULUS,
    )
    .unwrap();

    c.bench_function("driver/register_and_run_n1024", |b| {
        b.iter(|| {
            let mut cache: EnvironmentCache<NullBackend> = EnvironmentCache::new();
            let mut driver = BenchmarkDriver::with_iterations(8);
            register_all(&catalogue, &mut cache, &mut driver).unwrap();
            black_box(driver.run_matching("/ bfv / add_ct").unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_keep_running_loop,
    bench_pause_resume,
    bench_driver_end_to_end
);
criterion_main!(benches);
