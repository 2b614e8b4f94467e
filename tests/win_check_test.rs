mod common;

use common::{hand, tile, tiles};
use majiang_engine::tile::{EvalOptions, TileCounts};
use majiang_engine::{HandEvaluator, Suit, Tile, TileKindSet, WinType};
use proptest::prelude::*;

/// 测试一条龙加刻子：123 456 789 条 + 1 筒刻子 + 7 字对
#[test]
fn test_full_straight_with_triplet() {
    let evaluator = HandEvaluator::new();
    let concealed = hand("123456789s 11p 77z");
    assert_eq!(concealed.total_count(), 13);

    let result = evaluator.check_with(&concealed, tile("1p"), 0);
    assert!(result.is_win);
    assert_eq!(result.win_type, WinType::Normal);
    assert_eq!(result.pair, Some(tile("7z")));
    assert_eq!(result.groups.len(), 4);
}

/// 测试 12 张牌（一条龙 + 三张 1 筒）摸到 1 筒：张数不对，不能胡
#[test]
fn test_short_hand_is_rejected() {
    let evaluator = HandEvaluator::new();
    let short = hand("123456789s 111p");
    assert_eq!(short.total_count(), 12);
    assert!(!evaluator.check_with(&short, tile("1p"), 0).is_win);
    // 有一组副露时 10 张加一张即可
    assert!(evaluator.check_with(&hand("123456789s 1p"), tile("1p"), 1).is_win);
}

/// 测试七对：七种不同的牌各两张
#[test]
fn test_seven_pairs() {
    let evaluator = HandEvaluator::new();
    let pairs = hand("1155m 99p 2288s 1133z");
    let result = evaluator.check(&pairs, 0);
    assert!(result.is_win);
    assert_eq!(result.win_type, WinType::SevenPairs);

    let without = HandEvaluator::new().options(EvalOptions {
        allow_seven_pairs: false,
        ..EvalOptions::default()
    });
    assert!(!without.check(&pairs, 0).is_win);
}

/// 测试十三幺及其差一张的变体
#[test]
fn test_thirteen_orphans_and_one_off() {
    let evaluator = HandEvaluator::new();
    let orphans = hand("19m 19p 19s 1234567z 1z");
    assert_eq!(evaluator.check(&orphans, 0).win_type, WinType::ThirteenOrphans);

    let one_off = hand("19m 19p 19s 1234567z 2m");
    assert!(!evaluator.check(&one_off, 0).is_win);
}

/// 测试和张恰好为两面听的两张
#[test]
fn test_completing_tiles_exact() {
    let evaluator = HandEvaluator::new();
    let waiting = hand("123m 456p 789s 11z 45s");
    let expected: TileKindSet = tiles("36s").into_iter().collect();
    assert_eq!(evaluator.find_completing_tiles(&waiting, 0), expected);
    assert!(evaluator.is_ready(&waiting, 0));
}

/// 测试缺门未打完不能胡
#[test]
fn test_void_suit_blocks_completion() {
    let complete = hand("123m 456p 789s 111z 22p");
    assert!(HandEvaluator::new().check(&complete, 0).is_win);
    assert!(!HandEvaluator::new().void_suit(Some(Suit::Wan)).check(&complete, 0).is_win);
}

/// 测试无财神时能胡的牌，有财神（未用上）时仍能胡
#[test]
fn test_wildcard_never_loses_completion() {
    let complete = hand("234m 555p 678s 777z 99s");
    for kind in Tile::all_kinds() {
        let evaluator = HandEvaluator::new().wildcard(Some(kind));
        assert!(evaluator.check(&complete, 0).is_win, "wildcard {kind}");
    }
}

fn group_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop_oneof![
        // 刻子
        (0usize..Tile::KIND_COUNT).prop_map(|index| vec![index; 3]),
        // 顺子
        (0usize..3, 0usize..7).prop_map(|(suit, start)| {
            let base = suit * 9 + start;
            vec![base, base + 1, base + 2]
        }),
    ]
}

fn complete_hand_strategy() -> impl Strategy<Value = Vec<Tile>> {
    (prop::collection::vec(group_strategy(), 4), 0usize..Tile::KIND_COUNT).prop_filter_map(
        "more than four copies",
        |(groups, pair)| {
            let mut counts: TileCounts = [0; Tile::KIND_COUNT];
            for index in groups.iter().flatten().copied().chain([pair, pair]) {
                counts[index] += 1;
                if counts[index] > Tile::COPIES {
                    return None;
                }
            }
            groups
                .iter()
                .flatten()
                .copied()
                .chain([pair, pair])
                .map(Tile::from_kind_index)
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 四组加一对一定能胡
    #[test]
    fn prop_groups_and_pair_complete(tiles in complete_hand_strategy()) {
        let complete = majiang_engine::Hand::from_tiles(tiles.iter().copied());
        prop_assert!(HandEvaluator::new().check(&complete, 0).is_win);
    }

    /// 去掉任意一张，和张里一定有这张
    #[test]
    fn prop_removed_tile_is_a_wait(tiles in complete_hand_strategy(), pick in 0usize..14) {
        let removed = tiles[pick];
        let mut waiting = majiang_engine::Hand::from_tiles(tiles.iter().copied());
        prop_assert!(waiting.remove_tile(removed));
        let waits = HandEvaluator::new().find_completing_tiles(&waiting, 0);
        prop_assert!(waits.contains(removed));
    }

    /// 加入财神能力不会让能胡的牌变成不能胡
    #[test]
    fn prop_wildcard_monotonic(tiles in complete_hand_strategy(), wildcard in 0usize..Tile::KIND_COUNT) {
        let complete = majiang_engine::Hand::from_tiles(tiles.iter().copied());
        let wildcard = Tile::from_kind_index(wildcard);
        prop_assert!(HandEvaluator::new().wildcard(wildcard).check(&complete, 0).is_win);
    }
}
