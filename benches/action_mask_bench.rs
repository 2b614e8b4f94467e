use criterion::{black_box, criterion_group, criterion_main, Criterion};
use majiang_engine::game::rules::{RoundRules, RulesetConfig, RulesetKind};
use majiang_engine::{ActionMask, SeatState, Tile, TileInfo, TileOrigin};

fn dealt_state() -> SeatState {
    let mut state = SeatState::new(1);
    let tiles = [
        Tile::Wan(2),
        Tile::Wan(3),
        Tile::Wan(4),
        Tile::Tong(5),
        Tile::Tong(5),
        Tile::Tong(6),
        Tile::Tong(7),
        Tile::Tiao(1),
        Tile::Tiao(1),
        Tile::Tiao(8),
        Tile::Tiao(9),
        Tile::Zi(1),
        Tile::Zi(1),
    ];
    state.deal(&tiles).unwrap();
    state
}

fn bench_for_discard(c: &mut Criterion) {
    let state = dealt_state();
    let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::Classic));
    let info = TileInfo::new(2, Tile::Tong(5), 0, TileOrigin::Thrown);
    c.bench_function("action_mask_for_discard", |b| {
        b.iter(|| black_box(ActionMask::for_discard(black_box(&state), &rules, black_box(&info))));
    });
}

fn bench_for_new_tile_declared_ready(c: &mut Criterion) {
    let mut state = dealt_state();
    if state.receive(Tile::Tiao(7)).is_err() {
        return;
    }
    let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::DeclaredReady));
    c.bench_function("action_mask_for_new_tile_ready_search", |b| {
        b.iter(|| black_box(ActionMask::for_new_tile(black_box(&state), &rules, None)));
    });
}

criterion_group!(benches, bench_for_discard, bench_for_new_tile_declared_ready);
criterion_main!(benches);
