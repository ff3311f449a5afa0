//! Criterion benchmarks for the lesson planner.
//!
//! Rosters are generated from a fixed seed: every student gets one to
//! three weekday windows between 08:00 and 18:00 and a 30 to 60 minute
//! lesson.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lesson_planner::calendar::{TimeChunk, Weekday};
use lesson_planner::cp::ExhaustiveSolver;
use lesson_planner::planner::{Planner, SolveConfig};
use lesson_planner::roster::{AvailabilityRange, Candidates, ExpansionPolicy, Roster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_roster(students: usize, seed: u64) -> Roster {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut roster = Roster::new();
    for i in 0..students {
        let duration = rng.random_range(3..=6);
        let windows = rng.random_range(1..=3);
        let ranges = (0..windows)
            .map(|_| {
                let day = Weekday::ALL[rng.random_range(0..5)];
                let hour = rng.random_range(8..16);
                let length = rng.random_range(duration..=duration + 12);
                let start = TimeChunk::from_weekday_time(day, hour, 0).unwrap();
                AvailabilityRange::new(start, start + length).unwrap()
            })
            .collect();
        roster
            .register(i as u64, format!("student {i}"), duration, ranges)
            .unwrap();
    }
    roster
}

fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion");
    group.sample_size(20);

    for students in [50usize, 500] {
        let roster = random_roster(students, 42);
        for (label, policy) in [
            ("unbounded", ExpansionPolicy::default()),
            ("capped", ExpansionPolicy::default().with_max_attempts(4).with_step(2)),
        ] {
            group.bench_with_input(
                BenchmarkId::new(label, students),
                &(roster.clone(), policy),
                |b, (r, p)| b.iter(|| black_box(Candidates::expand(black_box(r), p))),
            );
        }
    }
    group.finish();
}

fn bench_backtrack(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtrack");
    group.sample_size(10);

    for students in [10usize, 25, 40] {
        let roster = random_roster(students, 7);
        let config = SolveConfig::default()
            .with_allow_skip(true)
            .with_time_limit_ms(2_000);
        group.bench_with_input(
            BenchmarkId::from_parameter(students),
            &(roster, config),
            |b, (r, cfg)| {
                b.iter(|| {
                    let result = Planner::new(black_box(r), cfg.clone()).backtrack();
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_build_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_model");
    group.sample_size(10);

    for students in [20usize, 80] {
        let roster = random_roster(students, 11);
        let config = SolveConfig::default().with_allow_skip(true);
        group.bench_with_input(
            BenchmarkId::from_parameter(students),
            &(roster, config),
            |b, (r, cfg)| {
                b.iter(|| {
                    let model = Planner::new(black_box(r), cfg.clone()).build_model();
                    black_box(model)
                })
            },
        );
    }
    group.finish();
}

fn bench_optimize_small(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize_exhaustive");
    group.sample_size(10);

    for students in [3usize, 5] {
        let roster = random_roster(students, 3);
        let config = SolveConfig::default()
            .with_allow_skip(true)
            .with_max_attempts(3)
            .with_step(2)
            .with_time_limit_ms(1_000);
        group.bench_with_input(
            BenchmarkId::from_parameter(students),
            &(roster, config),
            |b, (r, cfg)| {
                b.iter(|| {
                    let result = Planner::new(black_box(r), cfg.clone()).optimize(&ExhaustiveSolver::new());
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_expansion,
    bench_backtrack,
    bench_build_model,
    bench_optimize_small
);
criterion_main!(benches);
