use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::action::ActionKind;
use crate::game::claim::{ChiOption, ClaimHandler};
use crate::game::constants::previous_seat;
use crate::game::kong::{GangCandidate, KongHandler};
use crate::game::meld::GangKind;
use crate::game::player::SeatState;
use crate::game::ready::ReadyChecker;
use crate::game::rules::RoundRules;
use crate::game::tile_info::TileInfo;
use crate::game::void_suit::VoidSuitRules;
use crate::tile::{Tile, WinType};
use crate::utils::TileKindSet;

/// 一个牌事件的候选动作集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActions {
    /// 可以胡
    pub hu: bool,
    /// 可以杠的牌
    pub gangs: SmallVec<[GangCandidate; 4]>,
    /// 可以碰
    pub peng: bool,
    /// 可以吃的组合
    pub chi: SmallVec<[ChiOption; 3]>,
    /// 报听时可以打出的牌
    pub ting: TileKindSet,
}

impl PendingActions {
    pub fn is_empty(&self) -> bool {
        !self.hu && self.gangs.is_empty() && !self.peng && self.chi.is_empty() && self.ting.is_empty()
    }

    pub fn has(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Hu => self.hu,
            ActionKind::Gang => !self.gangs.is_empty(),
            ActionKind::Peng => self.peng,
            ActionKind::Chi => !self.chi.is_empty(),
        }
    }

    /// 按优先级列出可仲裁的动作种类
    pub fn kinds(&self) -> SmallVec<[ActionKind; 4]> {
        ActionKind::PRIORITY
            .iter()
            .copied()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    /// 只保留一种动作
    pub fn only(&self, kind: ActionKind) -> PendingActions {
        let mut result = PendingActions::default();
        match kind {
            ActionKind::Hu => result.hu = self.hu,
            ActionKind::Gang => result.gangs = self.gangs.clone(),
            ActionKind::Peng => result.peng = self.peng,
            ActionKind::Chi => result.chi = self.chi.clone(),
        }
        result
    }

    /// `self` 中的每个动作都出现在 `other` 中
    pub fn is_subset_of(&self, other: &PendingActions) -> bool {
        (!self.hu || other.hu)
            && (!self.peng || other.peng)
            && self.gangs.iter().all(|g| other.gangs.contains(g))
            && self.chi.iter().all(|c| other.chi.contains(c))
            && self.ting.difference(other.ting).is_empty()
    }

    pub fn gang_for(&self, tile: Tile) -> Option<GangCandidate> {
        self.gangs.iter().copied().find(|g| g.tile == tile)
    }

    pub fn chi_at(&self, position: u8) -> Option<ChiOption> {
        self.chi.iter().copied().find(|c| c.position == position)
    }
}

/// 动作掩码
///
/// 计算座位对一个牌事件的全部合法候选动作。只读座位状态，不做任何修改
pub struct ActionMask;

impl ActionMask {
    /// 摸牌后的候选动作
    ///
    /// 依次计算：报听、自摸、杠（暗杠、加杠）以及杠上开花提示
    ///
    /// # 参数
    ///
    /// - `state`: 已经摸入新牌的座位状态
    /// - `rules`: 本局规则
    /// - `replacement_hint`: 下一张杠后补牌（亮牌），用于杠上开花提示
    pub fn for_new_tile(state: &SeatState, rules: &RoundRules, replacement_hint: Option<Tile>) -> PendingActions {
        let config = &rules.config;
        let evaluator = rules.evaluator(state.void_suit);
        let mut pending = PendingActions::default();

        if config.requires_ready_declaration && !state.ready {
            pending.ting = ReadyChecker::ting_discards(state, &evaluator);
        }

        let may_win = !config.requires_ready_declaration || state.ready;
        pending.hu = may_win && evaluator.check(&state.hand, state.meld_count()).is_win;

        if config.allow_gang {
            let concealed = KongHandler::concealed_candidates(state)
                .into_iter()
                .map(|tile| (tile, GangKind::Concealed));
            let promoted = KongHandler::promoted_peng_candidates(state)
                .into_iter()
                .map(|tile| (tile, GangKind::PromotedPeng));

            for (tile, kind) in concealed.chain(promoted) {
                if state.void_suit == Some(tile.suit()) {
                    continue;
                }
                if state.ready && !Self::kong_keeps_ready(state, tile, kind, rules) {
                    continue;
                }
                let flower = replacement_hint.is_some_and(|next| {
                    KongHandler::completes_after_kong(state, tile, kind, next, &evaluator)
                });
                pending.gangs.push(GangCandidate { tile, kind, flower });
            }
        }

        pending
    }

    /// 别人打出的牌的候选动作（胡、明杠、碰、吃）
    ///
    /// 吃只能吃上家的数牌；报听后只能胡
    pub fn for_discard(state: &SeatState, rules: &RoundRules, info: &TileInfo) -> PendingActions {
        let config = &rules.config;
        let tile = info.tile;
        let mut pending = PendingActions::default();
        if state.is_out() || info.origin_seat == state.seat {
            return pending;
        }

        let evaluator = rules.evaluator(state.void_suit);
        let may_win = !config.self_draw_only && (!config.requires_ready_declaration || state.ready);
        pending.hu = may_win && evaluator.check_with(&state.hand, tile, state.meld_count()).is_win;

        if state.ready || state.void_suit == Some(tile.suit()) {
            return pending;
        }
        if state.won && !config.allow_repeat_win {
            return pending;
        }

        if config.allow_gang && KongHandler::can_promote_triplet(state, tile) {
            pending.gangs.push(GangCandidate {
                tile,
                kind: GangKind::PromotedTriplet,
                flower: false,
            });
        }
        pending.peng = config.allow_peng && ClaimHandler::can_peng(state, tile);
        if config.allow_chi && info.origin_seat == previous_seat(state.seat) {
            pending.chi = ClaimHandler::chi_options(state, tile);
        }
        pending
    }

    /// 抢杠的候选动作（只有胡）
    ///
    /// 暗杠只有在规则允许时才能抢，并且只能以十三幺胡
    pub fn for_rob_kong(state: &SeatState, rules: &RoundRules, info: &TileInfo, concealed: bool) -> PendingActions {
        let config = &rules.config;
        let mut pending = PendingActions::default();
        if state.is_out() || info.origin_seat == state.seat || config.self_draw_only {
            return pending;
        }
        if concealed && !config.allow_rob_concealed_kong {
            return pending;
        }
        if config.requires_ready_declaration && !state.ready {
            return pending;
        }

        let result = rules
            .evaluator(state.void_suit)
            .check_with(&state.hand, info.tile, state.meld_count());
        pending.hu = result.is_win && (!concealed || result.win_type == WinType::ThirteenOrphans);
        pending
    }

    /// 当前允许打出的牌
    ///
    /// 定缺门没打完时只能打定缺门；报听后只能打新摸的牌或不改变听牌的牌
    pub fn allowed_throws(state: &SeatState, rules: &RoundRules) -> TileKindSet {
        let held: TileKindSet = state.hand.distinct_tiles().into_iter().collect();
        let mut allowed = held;

        if let Some(restriction) = VoidSuitRules::throw_restriction(state) {
            allowed = allowed.intersection(restriction);
        }
        if state.ready {
            let evaluator = rules.evaluator(state.void_suit);
            allowed = allowed.intersection(ReadyChecker::allowed_throws(state, &evaluator));
        }

        if allowed.is_empty() {
            held
        } else {
            allowed
        }
    }

    /// 报听后的暗杠/加杠只能杠刚摸到的牌，且不能改变听牌
    fn kong_keeps_ready(state: &SeatState, tile: Tile, kind: GangKind, rules: &RoundRules) -> bool {
        if state.new_tile != Some(tile) {
            return false;
        }
        let mut after = state.clone();
        if !after.hand.remove_n(tile, kind.concealed_needed()) {
            return false;
        }
        let meld_count = match kind {
            GangKind::PromotedPeng => state.meld_count(),
            _ => state.meld_count() + 1,
        };
        rules
            .evaluator(state.void_suit)
            .find_completing_tiles(&after.hand, meld_count)
            == state.ready_waits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::meld::Meld;
    use crate::game::rules::{RulesetConfig, RulesetKind};
    use crate::game::tile_info::TileOrigin;
    use crate::tile::Suit;

    fn classic() -> RoundRules {
        RoundRules::new(RulesetConfig::for_kind(RulesetKind::Classic))
    }

    fn seat_with(seat: u8, tiles: &[Tile]) -> SeatState {
        let mut state = SeatState::new(seat);
        state.deal(tiles).unwrap();
        state
    }

    fn discard(tile: Tile, from: u8) -> TileInfo {
        TileInfo::new(1, tile, from, TileOrigin::Thrown)
    }

    #[test]
    fn test_chi_only_from_previous_seat() {
        let state = seat_with(2, &[Tile::Wan(2), Tile::Wan(3), Tile::Zi(1), Tile::Zi(1)]);
        let rules = classic();

        let from_prev = ActionMask::for_discard(&state, &rules, &discard(Tile::Wan(1), 1));
        assert_eq!(from_prev.chi.len(), 1);

        let from_other = ActionMask::for_discard(&state, &rules, &discard(Tile::Wan(1), 0));
        assert!(from_other.chi.is_empty());

        let honor = ActionMask::for_discard(&state, &rules, &discard(Tile::Zi(1), 1));
        assert!(honor.chi.is_empty());
        assert!(honor.peng);
    }

    #[test]
    fn test_peng_and_gang_on_discard() {
        let state = seat_with(0, &[Tile::Tong(7); 3]);
        let pending = ActionMask::for_discard(&state, &classic(), &discard(Tile::Tong(7), 3));
        assert!(pending.peng);
        assert_eq!(pending.gangs[0].kind, GangKind::PromotedTriplet);
        assert_eq!(pending.kinds().as_slice(), &[ActionKind::Gang, ActionKind::Peng]);
    }

    #[test]
    fn test_blood_battle_has_no_chi_and_respects_void() {
        let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::BloodBattle));
        let mut state = seat_with(1, &[Tile::Wan(2), Tile::Wan(3), Tile::Tiao(4), Tile::Tiao(4)]);
        state.declare_void(Suit::Tiao);

        let pending = ActionMask::for_discard(&state, &rules, &discard(Tile::Wan(1), 0));
        assert!(pending.chi.is_empty());
        let pending = ActionMask::for_discard(&state, &rules, &discard(Tile::Tiao(4), 0));
        assert!(!pending.peng);
    }

    #[test]
    fn test_new_tile_self_draw_and_gangs() {
        let mut state = seat_with(
            0,
            &[
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Tong(2),
                Tile::Tong(3),
                Tile::Tong(4),
                Tile::Tiao(6),
                Tile::Tiao(7),
                Tile::Tiao(8),
                Tile::Zi(3),
                Tile::Zi(3),
                Tile::Zi(3),
            ],
        );
        state.receive(Tile::Tiao(9)).unwrap();
        let pending = ActionMask::for_new_tile(&state, &classic(), None);
        assert!(!pending.hu);
        assert_eq!(pending.gangs.len(), 1);
        assert_eq!(pending.gangs[0].kind, GangKind::Concealed);
        assert!(!pending.gangs[0].flower);
        assert!(pending.ting.is_empty());
    }

    #[test]
    fn test_kong_flower_hint() {
        // 1111 万 + 234 筒 + 678 条 + 西西西 + 9 条：暗杠后补到 9 条胡
        let mut state = seat_with(
            0,
            &[
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Wan(1),
                Tile::Tong(2),
                Tile::Tong(3),
                Tile::Tong(4),
                Tile::Tiao(6),
                Tile::Tiao(7),
                Tile::Tiao(8),
                Tile::Zi(3),
                Tile::Zi(3),
                Tile::Zi(3),
            ],
        );
        state.receive(Tile::Tiao(9)).unwrap();
        let pending = ActionMask::for_new_tile(&state, &classic(), Some(Tile::Tiao(9)));
        assert!(pending.gangs[0].flower);
    }

    #[test]
    fn test_declared_ready_blocks_win_until_ting() {
        let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::DeclaredReady));
        let mut state = seat_with(
            0,
            &[
                Tile::Wan(1),
                Tile::Wan(2),
                Tile::Wan(3),
                Tile::Wan(4),
                Tile::Wan(5),
                Tile::Wan(6),
                Tile::Tong(7),
                Tile::Tong(8),
                Tile::Tong(9),
                Tile::Zi(1),
                Tile::Zi(1),
                Tile::Zi(1),
                Tile::Tiao(5),
            ],
        );
        state.receive(Tile::Tiao(5)).unwrap();
        let pending = ActionMask::for_new_tile(&state, &rules, None);
        assert!(!pending.hu);
        assert!(!pending.ting.is_empty());

        state.declare_ready([Tile::Tiao(5)].into_iter().collect());
        let pending = ActionMask::for_new_tile(&state, &rules, None);
        assert!(pending.hu);
        assert!(pending.ting.is_empty());
    }

    #[test]
    fn test_rob_kong() {
        let state = seat_with(
            1,
            &[
                Tile::Wan(1),
                Tile::Wan(2),
                Tile::Wan(3),
                Tile::Wan(4),
                Tile::Wan(5),
                Tile::Wan(6),
                Tile::Tong(7),
                Tile::Tong(8),
                Tile::Tong(9),
                Tile::Zi(1),
                Tile::Zi(1),
                Tile::Zi(1),
                Tile::Tiao(5),
            ],
        );
        let info = TileInfo::new(9, Tile::Tiao(5), 0, TileOrigin::Claimed);
        assert!(ActionMask::for_rob_kong(&state, &classic(), &info, false).hu);
        // 暗杠不能抢（除非十三幺且规则允许）
        assert!(!ActionMask::for_rob_kong(&state, &classic(), &info, true).hu);

        let wildcard = RoundRules::new(RulesetConfig::for_kind(RulesetKind::Wildcard));
        assert!(!ActionMask::for_rob_kong(&state, &wildcard, &info, false).hu);
    }

    #[test]
    fn test_rob_concealed_kong_thirteen_orphans_only() {
        let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::DeclaredReady));
        let tiles: Vec<Tile> = TileKindSet::orphans().iter().filter(|t| *t != Tile::Zi(7)).collect();
        let mut state = seat_with(2, &tiles);
        state.receive(Tile::Zi(1)).unwrap();
        let info = TileInfo::new(4, Tile::Zi(7), 0, TileOrigin::Claimed);

        // 未报听不能抢
        state.new_tile = None;
        assert!(!ActionMask::for_rob_kong(&state, &rules, &info, true).hu);

        state.declare_ready([Tile::Zi(7)].into_iter().collect());
        assert!(ActionMask::for_rob_kong(&state, &rules, &info, true).hu);
    }

    #[test]
    fn test_allowed_throws_void_first() {
        let rules = RoundRules::new(RulesetConfig::for_kind(RulesetKind::BloodBattle));
        let mut state = seat_with(0, &[Tile::Wan(1), Tile::Tong(2), Tile::Tong(3)]);
        state.declare_void(Suit::Tong);
        let allowed = ActionMask::allowed_throws(&state, &rules);
        assert_eq!(allowed.len(), 2);
        assert!(!allowed.contains(Tile::Wan(1)));
    }

    #[test]
    fn test_promoted_peng_candidate() {
        let mut state = seat_with(0, &[Tile::Wan(9), Tile::Tong(1), Tile::Tong(1)]);
        state.melds.push(Meld::Peng {
            tile: Tile::Wan(9),
            from: 2,
        });
        state.receive(Tile::Tiao(3)).unwrap();
        let pending = ActionMask::for_new_tile(&state, &classic(), None);
        assert_eq!(pending.gangs.len(), 1);
        assert_eq!(pending.gangs[0].kind, GangKind::PromotedPeng);
    }
}
