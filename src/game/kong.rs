use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::game::constants::SeatId;
use crate::game::meld::{GangKind, Meld};
use crate::game::player::SeatState;
use crate::tile::{HandEvaluator, Tile};

/// 杠的候选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GangCandidate {
    pub tile: Tile,
    pub kind: GangKind,
    /// 杠上开花：下一张补牌（亮牌）能让这手牌胡
    pub flower: bool,
}

/// 杠操作器
pub struct KongHandler;

impl KongHandler {
    /// 检查可以暗杠的牌（手牌中有四张相同的牌）
    pub fn concealed_candidates(state: &SeatState) -> SmallVec<[Tile; 4]> {
        state
            .hand
            .distinct_tiles()
            .into_iter()
            .filter(|&tile| state.hand.tile_count(tile) == 4)
            .collect()
    }

    /// 检查可以加杠的牌
    ///
    /// 加杠条件：
    /// 1. 已经碰了三张相同的牌
    /// 2. 手牌中有第四张
    pub fn promoted_peng_candidates(state: &SeatState) -> SmallVec<[Tile; 4]> {
        state
            .melds
            .iter()
            .filter_map(|meld| match meld {
                Meld::Peng { tile, .. } if state.hand.has_tile(*tile) => Some(*tile),
                _ => None,
            })
            .collect()
    }

    /// 检查是否可以明杠别人打出的牌（手牌中有三张相同的牌）
    pub fn can_promote_triplet(state: &SeatState, tile: Tile) -> bool {
        state.hand.tile_count(tile) >= 3
    }

    /// 执行杠
    ///
    /// # 参数
    ///
    /// - `state`: 座位状态（可变引用）
    /// - `tile`: 杠的牌
    /// - `kind`: 杠的来源
    /// - `from`: 明杠时打出这张牌的座位
    ///
    /// # 返回
    ///
    /// 新的副露；手牌不够时返回错误且不修改状态
    pub fn apply(
        state: &mut SeatState,
        tile: Tile,
        kind: GangKind,
        from: Option<SeatId>,
    ) -> EngineResult<Meld> {
        match kind {
            GangKind::Concealed | GangKind::PromotedTriplet => {
                state.remove_concealed(tile, kind.concealed_needed(), "gang")?;
                let meld = Meld::Gang { tile, kind, from };
                state.melds.push(meld);
                Ok(meld)
            }
            GangKind::PromotedPeng => {
                let index = state
                    .melds
                    .iter()
                    .position(|meld| matches!(meld, Meld::Peng { tile: t, .. } if *t == tile))
                    .ok_or(EngineError::InsufficientTiles {
                        seat: state.seat,
                        event: state.event(),
                        action: "gang",
                        tile,
                        needed: 3,
                        held: 0,
                    })?;
                let peng_from = match state.melds[index] {
                    Meld::Peng { from, .. } => Some(from),
                    _ => None,
                };
                state.remove_concealed(tile, 1, "gang")?;
                let meld = Meld::Gang {
                    tile,
                    kind,
                    from: peng_from,
                };
                state.melds[index] = meld;
                Ok(meld)
            }
        }
    }

    /// 杠上开花检查：执行杠并摸到 `replacement` 后是否胡牌（不修改状态）
    pub fn completes_after_kong(
        state: &SeatState,
        tile: Tile,
        kind: GangKind,
        replacement: Tile,
        evaluator: &HandEvaluator,
    ) -> bool {
        let mut hand = state.hand.clone();
        if !hand.remove_n(tile, kind.concealed_needed()) {
            return false;
        }
        let meld_count = match kind {
            GangKind::PromotedPeng => state.meld_count(),
            _ => state.meld_count() + 1,
        };
        evaluator.check_with(&hand, replacement, meld_count).is_win
    }
}
