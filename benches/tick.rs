//! Tick loop benchmarks: a crowded wave and state hashing.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use bladewave::game::boss::BossConfig;
use bladewave::game::enemy::{Agent, EnemyAgent, EnemyStats, EnemyTier};
use bladewave::game::tick::tick;
use bladewave::{InputFrame, SimConfig, Vec2, World, TICK_DT};

fn setup_world(n: u32) -> World {
    let mut world = World::new(SimConfig::default(), 42).unwrap();
    let stats = EnemyStats::for_wave(10, EnemyTier::Normal, &world.config.enemy, &BossConfig::default());
    for i in 0..n {
        let angle = i as f32 * 0.37;
        let radius = 3.0 + (i % 7) as f32;
        let position = Vec2::from_angle(angle) * radius;
        let id = 10_000 + i;
        let enemy = EnemyAgent::new(id, position, &stats, &world.config.enemy);
        world.agents.insert(id, Agent::Grunt(enemy));
    }
    world
}

fn bench_tick(c: &mut Criterion) {
    let input = InputFrame::with_movement(0.3, -0.2).with_flags(InputFrame::FLAG_ATTACK);

    c.bench_function("tick_200_enemies", |b| {
        b.iter_batched(
            || setup_world(200),
            |mut world| {
                for _ in 0..10 {
                    tick(&mut world, &input, TICK_DT);
                }
                world
            },
            BatchSize::PerIteration,
        )
    });

    let world = setup_world(200);
    c.bench_function("compute_hash_200_enemies", |b| b.iter(|| world.compute_hash()));
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
