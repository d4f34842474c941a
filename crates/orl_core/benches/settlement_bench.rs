//! Performance Benchmarks for Battle Settlement
//!
//! Benchmarks:
//! - Outcome resolution from raw battle reports
//! - Streaming revenue formula
//! - Single solo settlement end to end
//! - Full cycle throughput at varying battle counts
//! - Cycle archive encoding and decoding

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use orl_core::archive::{decompress_and_deserialize, serialize_and_compress, CycleArchive};
use orl_core::economy::{EconomyConfig, RevenueCalculator};
use orl_core::models::{BattleReport, FighterReport, RobotRecord};
use orl_core::pipeline::{
    CyclePipeline, MemoryAuditSink, MemoryParticipantStore, MemoryStudioDirectory,
    ParticipantStore, StableFacilities,
};
use orl_core::scenario::{ScenarioBuilder, ScenarioShape};
use orl_core::settlement::OutcomeResolver;

type MemoryPipeline =
    CyclePipeline<MemoryParticipantStore, MemoryStudioDirectory, MemoryAuditSink>;

fn solo_report(cycle_number: u32) -> BattleReport {
    BattleReport::solo(
        cycle_number,
        FighterReport::new(1, 62.0, 0.0).with_damage(110.0, 180),
        FighterReport::new(2, 0.0, 0.0).with_damage(45.0, 150),
    )
    .with_duration(180, false)
}

fn seeded_pipeline() -> MemoryPipeline {
    let pipeline = CyclePipeline::in_memory(EconomyConfig::standard());
    for (robot_id, stable_id, name) in [(1, 10, "Havoc"), (2, 20, "Rustbucket")] {
        pipeline
            .studio_directory()
            .register(stable_id, StableFacilities::new(3, 2))
            .unwrap();
        pipeline
            .participant_store()
            .commit(vec![RobotRecord::new(robot_id, stable_id, name)])
            .unwrap();
    }
    pipeline
}

fn demo_pipeline(
    demo_robots: Vec<RobotRecord>,
    stables: &[(u64, StableFacilities)],
) -> MemoryPipeline {
    let pipeline = CyclePipeline::in_memory(EconomyConfig::standard());
    for (stable_id, facilities) in stables {
        pipeline.studio_directory().register(*stable_id, *facilities).unwrap();
    }
    pipeline.participant_store().commit(demo_robots).unwrap();
    pipeline
}

/// Benchmark verdict resolution from a raw report
fn bench_outcome_resolution(c: &mut Criterion) {
    let report = solo_report(1);

    c.bench_function("outcome_resolution", |b| {
        b.iter(|| black_box(OutcomeResolver::resolve(black_box(&report))))
    });
}

/// Benchmark the streaming revenue formula
fn bench_revenue_formula(c: &mut Criterion) {
    let calculator = RevenueCalculator::default();

    c.bench_function("revenue_formula", |b| {
        b.iter(|| {
            black_box(calculator.calculate(
                black_box(1234),
                black_box(5678),
                black_box(7),
                black_box(false),
            ))
        })
    });
}

/// Benchmark one solo settlement end to end
fn bench_solo_settlement(c: &mut Criterion) {
    let pipeline = seeded_pipeline();
    let report = solo_report(1);

    c.bench_function("solo_settlement", |b| {
        b.iter(|| black_box(pipeline.settle(black_box(&report))))
    });
}

/// Benchmark cycle throughput at varying battle counts
fn bench_cycle_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_throughput");

    for count in [4u32, 16, 64] {
        let shape = ScenarioShape {
            name: format!("bench_{}", count),
            description: String::new(),
            league_battles: count,
            tag_battles: 0,
            tournament_battles: 0,
            byes: 0,
            time_limit_seconds: 180,
            damage_mean: 110.0,
            damage_std: 45.0,
        };
        let demo = ScenarioBuilder::with_shape(42, shape).build_cycle(1);

        // Audit sequences are monotone within a cycle, so each iteration
        // settles on a fresh pipeline instead of replaying the same one.
        group.bench_with_input(BenchmarkId::from_parameter(count), &demo, |b, demo| {
            b.iter_batched(
                || demo_pipeline(demo.robots.clone(), &demo.stables),
                |pipeline| black_box(pipeline.settle_cycle(1, &demo.reports)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark cycle archive encode and decode
fn bench_archive_roundtrip(c: &mut Criterion) {
    let demo = ScenarioBuilder::new(9).build_cycle(1);
    let pipeline = demo_pipeline(demo.robots.clone(), &demo.stables);
    let summary = pipeline.settle_cycle(1, &demo.reports).unwrap();
    let events = pipeline.audit_sink().cycle_events(1).unwrap();
    let rows = pipeline.ledger_rows(1).unwrap();

    let archive = CycleArchive::new(1, summary, events, rows);
    let encoded = serialize_and_compress(&archive).unwrap();

    c.bench_function("archive_encode", |b| {
        b.iter(|| black_box(serialize_and_compress(black_box(&archive))))
    });

    c.bench_function("archive_decode", |b| {
        b.iter(|| black_box(decompress_and_deserialize(black_box(&encoded))))
    });
}

criterion_group!(
    benches,
    bench_outcome_resolution,
    bench_revenue_formula,
    bench_solo_settlement,
    bench_cycle_throughput,
    bench_archive_roundtrip,
);

criterion_main!(benches);
