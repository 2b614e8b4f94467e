use tracing::debug;

use crate::game::constants::SeatId;
use crate::game::player::SeatState;
use crate::tile::{Hand, Suit};
use crate::utils::TileKindSet;

/// 定缺规则（三花色必缺一）
pub struct VoidSuitRules;

impl VoidSuitRules {
    /// 自动定缺：选择手牌中张数最少的花色（相同时取编号小的）
    pub fn auto_choice(hand: &Hand) -> Suit {
        let mut best = Suit::Wan;
        let mut best_count = usize::MAX;
        for suit in Suit::suited() {
            let count = hand.suit_count(suit);
            if count < best_count {
                best = suit;
                best_count = count;
            }
        }
        debug!(suit = ?best, count = best_count, "auto void suit");
        best
    }

    /// 定缺门还没打完时，只能打定缺门的牌
    ///
    /// # 返回
    ///
    /// 限制出牌的集合；没有限制时返回 None
    pub fn throw_restriction(state: &SeatState) -> Option<TileKindSet> {
        let suit = state.void_suit?;
        if !state.hand.has_suit(suit) {
            return None;
        }
        Some(TileKindSet::of_suit(suit))
    }

    /// 检查所有在场座位是否都已定缺
    pub fn all_declared(declared: &[Option<Suit>], active: impl Fn(SeatId) -> bool) -> bool {
        declared
            .iter()
            .enumerate()
            .filter(|(seat, _)| active(*seat as SeatId))
            .all(|(_, suit)| suit.is_some())
    }
}
