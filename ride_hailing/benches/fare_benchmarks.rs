use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ride_hailing::fare::{DistanceTier, PricingProfile, TierRates, TripType, compute_fare};
use std::hint::black_box;

fn full_tier_table(base: f64) -> TierRates {
    DistanceTier::ALL
        .iter()
        .enumerate()
        .fold(TierRates::default(), |rates, (i, tier)| {
            rates.with(*tier, base - i as f64)
        })
}

/// Flat per-km auto fare
fn bench_auto_fare(c: &mut Criterion) {
    let profile = PricingProfile::auto(15.0, 18.0);

    c.bench_function("auto_fare", |b| {
        b.iter(|| compute_fare(black_box(&profile), black_box(12.7), TripType::OneWay));
    });
}

/// Tier lookup across the table, including the fallback past 300 km
fn bench_tiered_fare(c: &mut Criterion) {
    let profile = PricingProfile::tiered(full_tier_table(20.0), full_tier_table(24.0));
    let mut group = c.benchmark_group("tiered_fare");

    for distance in [10.0, 120.0, 290.0, 850.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(distance),
            &distance,
            |b, &distance| {
                b.iter(|| compute_fare(black_box(&profile), black_box(distance), TripType::Return));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_auto_fare, bench_tiered_fare);
criterion_main!(benches);
