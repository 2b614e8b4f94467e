mod common;

use common::{commands_for, new_tiles, tile};
use majiang_engine::{
    Dispatch, DrawReason, GangKind, RoundCoordinator, RoundOutcome, RoundPhase, RulesetConfig, RulesetKind,
    SeatReport, TakenAction, WinSource, WinType,
};

fn limited(max_kongs: u8) -> RoundCoordinator {
    let config = RulesetConfig {
        max_kongs: Some(max_kongs),
        ..RulesetConfig::for_kind(RulesetKind::Classic)
    };
    let mut coordinator = RoundCoordinator::new(config, 0);
    let wall = coordinator.fresh_wall(Some(21));
    coordinator.start_round(wall).unwrap();
    coordinator
}

/// 庄家在事件 `event` 暗杠，补牌事件为 `event + 1`
fn concealed_kong(coordinator: &mut RoundCoordinator, event: u64) -> Vec<Dispatch> {
    coordinator
        .handle_report(SeatReport::TurnAction {
            seat: 0,
            event,
            action: TakenAction::Gang {
                tile: tile("1z"),
                kind: GangKind::Concealed,
            },
        })
        .unwrap()
}

fn throw(coordinator: &mut RoundCoordinator, event: u64) -> Vec<Dispatch> {
    coordinator
        .handle_report(SeatReport::TurnAction {
            seat: 0,
            event,
            action: TakenAction::Throw {
                tile: tile("9s"),
                waits: None,
            },
        })
        .unwrap()
}

/// 测试每次杠后从牌墙后端补牌，补牌事件依次递增
#[test]
fn test_replacement_events_follow_kongs() {
    let mut coordinator = limited(3);
    let back = coordinator.wall().peek_back();
    let out = concealed_kong(&mut coordinator, 1);
    assert_eq!(new_tiles(&out), vec![(0, 2)]);
    let drawn = out.iter().find_map(|dispatch| match dispatch {
        Dispatch::Seat {
            command: majiang_engine::SeatCommand::NewTile { info, .. },
            ..
        } => Some(info.tile),
        _ => None,
    });
    assert_eq!(drawn, back);

    let out = concealed_kong(&mut coordinator, 2);
    assert_eq!(new_tiles(&out), vec![(0, 3)]);
}

/// 测试未超过上限时出牌照常进行
#[test]
fn test_within_limit_play_continues() {
    let mut coordinator = limited(3);
    for event in 1..=3 {
        concealed_kong(&mut coordinator, event);
    }
    let out = throw(&mut coordinator, 4);
    assert_eq!(commands_for(&out, 1), vec!["claim_window"]);
    assert_eq!(coordinator.phase(), RoundPhase::Playing);
    assert_eq!(coordinator.round_state().record.kongs.len(), 3);
}

/// 测试超过上限的杠补牌后不胡，流局
#[test]
fn test_throw_after_last_kong_draws_the_round() {
    let mut coordinator = limited(3);
    for event in 1..=4 {
        concealed_kong(&mut coordinator, event);
    }
    let out = throw(&mut coordinator, 5);

    assert_eq!(
        coordinator.outcome(),
        Some(&RoundOutcome::Drawn {
            reason: DrawReason::KongLimit
        })
    );
    assert_eq!(commands_for(&out, 2), vec!["end_round"]);
}

/// 测试超过上限后再杠同样流局
#[test]
fn test_kong_after_last_kong_draws_the_round() {
    let mut coordinator = limited(3);
    for event in 1..=4 {
        concealed_kong(&mut coordinator, event);
    }
    concealed_kong(&mut coordinator, 5);
    assert_eq!(
        coordinator.outcome(),
        Some(&RoundOutcome::Drawn {
            reason: DrawReason::KongLimit
        })
    );
}

/// 测试最后一次补牌自摸算杠上开花
#[test]
fn test_last_replacement_can_still_win() {
    let mut coordinator = limited(3);
    for event in 1..=4 {
        concealed_kong(&mut coordinator, event);
    }
    coordinator
        .handle_report(SeatReport::TurnAction {
            seat: 0,
            event: 5,
            action: TakenAction::Hu {
                tile: tile("5m"),
                self_drawn: true,
                pattern: WinType::Normal,
            },
        })
        .unwrap();

    let Some(RoundOutcome::Normal { wins }) = coordinator.outcome() else {
        panic!("expected a win, got {:?}", coordinator.outcome());
    };
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0].source, WinSource::KongFlower);
}

/// 测试杠数上限在下一局重新计数
#[test]
fn test_kong_count_resets_each_round() {
    let mut coordinator = limited(1);
    concealed_kong(&mut coordinator, 1);
    concealed_kong(&mut coordinator, 2);
    throw(&mut coordinator, 3);
    assert!(matches!(coordinator.outcome(), Some(RoundOutcome::Drawn { .. })));
    coordinator.finish_round().unwrap();

    let wall = coordinator.fresh_wall(Some(22));
    coordinator.start_round(wall).unwrap();
    let first = coordinator.round_state().first_event;
    concealed_kong(&mut coordinator, first);
    let out = throw(&mut coordinator, first + 1);
    assert_eq!(commands_for(&out, 1), vec!["claim_window"]);
}
