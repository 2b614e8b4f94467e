use crate::game::player::SeatState;
use crate::tile::{HandEvaluator, Tile};
use crate::utils::TileKindSet;

/// 听牌判定器
pub struct ReadyChecker;

impl ReadyChecker {
    /// 13 张（扣除副露）手牌听的牌
    pub fn completing_tiles(state: &SeatState, evaluator: &HandEvaluator) -> TileKindSet {
        evaluator.find_completing_tiles(&state.hand, state.meld_count())
    }

    /// 打出 `tile` 后听的牌（不修改状态）
    pub fn waits_after_discard(state: &SeatState, tile: Tile, evaluator: &HandEvaluator) -> TileKindSet {
        let mut hand = state.hand.clone();
        if !hand.remove_tile(tile) {
            return TileKindSet::empty();
        }
        evaluator.find_completing_tiles(&hand, state.meld_count())
    }

    /// 14 张手牌中，打出后能听牌的牌
    ///
    /// # 返回
    ///
    /// 可报听的出牌集合；为空表示打哪张都不听
    pub fn ting_discards(state: &SeatState, evaluator: &HandEvaluator) -> TileKindSet {
        state
            .hand
            .distinct_tiles()
            .into_iter()
            .filter(|&tile| !Self::waits_after_discard(state, tile, evaluator).is_empty())
            .collect()
    }

    /// 报听后允许打出的牌
    ///
    /// 刚摸到的牌，或打出后听牌不变的牌
    pub fn allowed_throws(state: &SeatState, evaluator: &HandEvaluator) -> TileKindSet {
        state
            .hand
            .distinct_tiles()
            .into_iter()
            .filter(|&tile| {
                Some(tile) == state.new_tile
                    || Self::waits_after_discard(state, tile, evaluator) == state.ready_waits
            })
            .collect()
    }
}
