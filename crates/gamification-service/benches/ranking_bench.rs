//! 积分计算与排名性能基准测试
//!
//! 测试覆盖：
//! - 积分计算（纯函数）
//! - 不同规模下的排行榜排序与名次分配

use std::hint::black_box;

use campus_gamification::models::{EventCategory, Standing, rank_standings};
use campus_gamification::PointsCalculator;
use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// 生成排行榜快照，积分分布带有大量并列
fn create_standings(count: usize) -> Vec<Standing> {
    let now = Utc::now();
    (0..count)
        .map(|i| Standing {
            user_id: format!("user-{:06}", (i * 7919) % count),
            display_name: format!("User {}", i),
            total_points: ((i * 31) % 500) as i64,
            updated_at: now,
        })
        .collect()
}

fn bench_calculate(c: &mut Criterion) {
    let calculator = PointsCalculator::default();
    let attended = [
        EventCategory::Academic,
        EventCategory::Social,
        EventCategory::Sports,
    ];

    c.bench_function("points_calculate", |b| {
        b.iter(|| {
            for category in EventCategory::ALL {
                black_box(calculator.calculate(
                    black_box(category),
                    black_box(&attended),
                    black_box(false),
                ));
            }
        })
    });
}

fn bench_rank_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_standings");

    for size in [100usize, 1_000, 10_000].iter() {
        let standings = create_standings(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &standings, |b, standings| {
            b.iter(|| black_box(rank_standings(standings.clone(), 0)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calculate, bench_rank_standings);
criterion_main!(benches);
