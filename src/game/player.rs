use serde::{Deserialize, Serialize};

use crate::engine::action_mask::PendingActions;
use crate::error::{EngineError, EngineResult};
use crate::game::action::TakenAction;
use crate::game::constants::{EventId, SeatId};
use crate::game::meld::Meld;
use crate::game::tile_info::TileInfo;
use crate::tile::{Hand, Suit, Tile};
use crate::utils::TileKindSet;

/// 座位状态机的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatPhase {
    /// 等待摸牌
    AwaitingTile,
    /// 正在计算摸牌后的候选动作
    EvaluatingNewTile,
    /// 等待对候选动作的选择
    AwaitingActionChoice,
    /// 可以出牌
    ThrowReady,
    /// 已出牌
    Thrown,
    /// 正在计算对别人牌的候选动作
    EvaluatingClaim,
    /// 候选动作已上报，等待仲裁
    AwaitingGrant,
    /// 等待对仲裁结果的选择
    AwaitingClaimChoice,
    /// 已宣布杠，等待抢杠结果
    AwaitingKong,
    /// 胡牌离场
    Out,
}

/// 单个牌事件的动作记录
///
/// 执行一个动作后，同一事件的其他候选动作全部清空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub info: TileInfo,
    /// 仍待选择的候选动作
    pub pending: PendingActions,
    /// 最终执行的动作
    pub taken: Option<TakenAction>,
    /// 所有合法候选都已计算完成
    pub collected: bool,
}

impl ActionRecord {
    pub fn new(info: TileInfo) -> Self {
        Self {
            info,
            pending: PendingActions::default(),
            taken: None,
            collected: false,
        }
    }

    pub fn event(&self) -> EventId {
        self.info.event
    }

    pub fn collect(&mut self, pending: PendingActions) {
        self.pending = pending;
        self.collected = true;
    }

    pub fn take(&mut self, action: TakenAction) {
        self.pending = PendingActions::default();
        self.taken = Some(action);
    }
}

/// 座位状态（一家的手牌、副露、牌河和标志）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatState {
    pub seat: SeatId,
    /// 手牌（暗牌）
    pub hand: Hand,
    /// 副露
    pub melds: Vec<Meld>,
    /// 牌河
    pub discards: Vec<Tile>,
    /// 是否已报听
    pub ready: bool,
    /// 报听时的听牌集合
    pub ready_waits: TileKindSet,
    /// 定缺的花色
    pub void_suit: Option<Suit>,
    /// 刚摸到的牌（最多一张）
    pub new_tile: Option<Tile>,
    /// 是否已胡过牌
    pub won: bool,
    /// 胡到的牌
    pub wins: Vec<Tile>,
    pub phase: SeatPhase,
    pub record: Option<ActionRecord>,
}

impl SeatState {
    pub fn new(seat: SeatId) -> Self {
        Self {
            seat,
            hand: Hand::new(),
            melds: Vec::new(),
            discards: Vec::new(),
            ready: false,
            ready_waits: TileKindSet::empty(),
            void_suit: None,
            new_tile: None,
            won: false,
            wins: Vec::new(),
            phase: SeatPhase::AwaitingTile,
            record: None,
        }
    }

    /// 新一局：清空全部状态
    pub fn reset(&mut self) {
        *self = Self::new(self.seat);
    }

    /// 起手发牌
    pub fn deal(&mut self, tiles: &[Tile]) -> EngineResult<()> {
        for &tile in tiles {
            if !self.hand.add_tile(tile) {
                return Err(self.fifth_copy(tile, "deal"));
            }
        }
        Ok(())
    }

    fn fifth_copy(&self, tile: Tile, during: &str) -> EngineError {
        EngineError::InvalidPhase {
            seat: Some(self.seat),
            expected: "at most four copies of a tile",
            actual: format!("fifth {tile} during {during} in event {}", self.event()),
        }
    }

    pub fn meld_count(&self) -> u8 {
        self.melds.len() as u8
    }

    /// 当前牌事件编号（无事件时为 0）
    pub fn event(&self) -> EventId {
        self.record.as_ref().map_or(0, ActionRecord::event)
    }

    pub fn is_out(&self) -> bool {
        self.phase == SeatPhase::Out
    }

    /// 手中是否还有定缺门的牌
    pub fn has_void_tiles(&self) -> bool {
        self.void_suit.is_some_and(|suit| self.hand.has_suit(suit))
    }

    /// 胡牌后手牌冻结（允许连胡的玩法除外）
    pub fn ensure_mutable(&self, allow_repeat_win: bool) -> EngineResult<()> {
        if self.won && !allow_repeat_win {
            return Err(EngineError::HandFrozen {
                seat: self.seat,
                event: self.event(),
            });
        }
        Ok(())
    }

    /// 开始一个牌事件
    pub fn begin_event(&mut self, info: TileInfo, phase: SeatPhase) {
        self.record = Some(ActionRecord::new(info));
        self.phase = phase;
    }

    /// 记录本事件执行的动作
    pub fn take(&mut self, action: TakenAction) {
        if let Some(record) = self.record.as_mut() {
            record.take(action);
        }
    }

    /// 摸牌
    pub fn receive(&mut self, tile: Tile) -> EngineResult<()> {
        if !self.hand.add_tile(tile) {
            return Err(self.fifth_copy(tile, "draw"));
        }
        self.new_tile = Some(tile);
        Ok(())
    }

    /// 从手牌中移除 `n` 张（不够时不做任何修改）
    pub fn remove_concealed(&mut self, tile: Tile, n: u8, action: &'static str) -> EngineResult<()> {
        if !self.hand.remove_n(tile, n) {
            return Err(EngineError::InsufficientTiles {
                seat: self.seat,
                event: self.event(),
                action,
                tile,
                needed: n,
                held: self.hand.tile_count(tile),
            });
        }
        if self.new_tile == Some(tile) && !self.hand.has_tile(tile) {
            self.new_tile = None;
        }
        Ok(())
    }

    /// 出牌
    pub fn throw(&mut self, tile: Tile) -> EngineResult<()> {
        self.remove_concealed(tile, 1, "throw")?;
        self.discards.push(tile);
        self.new_tile = None;
        self.phase = SeatPhase::Thrown;
        Ok(())
    }

    pub fn declare_void(&mut self, suit: Suit) {
        self.void_suit = Some(suit);
    }

    pub fn declare_ready(&mut self, waits: TileKindSet) {
        self.ready = true;
        self.ready_waits = waits;
    }

    /// 记录胡牌
    ///
    /// 允许连胡时胡到的牌不进手牌，座位继续；否则座位离场，手牌保留用于展示
    pub fn record_win(&mut self, tile: Tile, self_drawn: bool, allow_repeat_win: bool) -> EngineResult<()> {
        if allow_repeat_win && self_drawn && !self.hand.remove_tile(tile) {
            return Err(EngineError::InsufficientTiles {
                seat: self.seat,
                event: self.event(),
                action: "hu",
                tile,
                needed: 1,
                held: 0,
            });
        }
        if !allow_repeat_win && !self_drawn && !self.hand.add_tile(tile) {
            return Err(self.fifth_copy(tile, "hu"));
        }

        self.won = true;
        self.wins.push(tile);
        self.new_tile = None;
        self.phase = if allow_repeat_win {
            SeatPhase::AwaitingTile
        } else {
            SeatPhase::Out
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tile_info::TileOrigin;

    #[test]
    fn test_throw_requires_tile() {
        let mut state = SeatState::new(1);
        state.deal(&[Tile::Wan(1), Tile::Wan(2)]).unwrap();
        assert!(state.throw(Tile::Wan(1)).is_ok());
        assert_eq!(state.discards, vec![Tile::Wan(1)]);
        assert_eq!(state.phase, SeatPhase::Thrown);

        let err = state.throw(Tile::Wan(9)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientTiles { seat: 1, .. }));
        // 失败的操作不改变手牌
        assert_eq!(state.hand.total_count(), 1);
    }

    #[test]
    fn test_record_clears_pending_on_take() {
        let mut state = SeatState::new(0);
        state.begin_event(TileInfo::new(5, Tile::Tong(3), 2, TileOrigin::Thrown), SeatPhase::EvaluatingClaim);
        let pending = PendingActions {
            peng: true,
            ..PendingActions::default()
        };
        if let Some(record) = state.record.as_mut() {
            record.collect(pending);
        }
        state.take(TakenAction::Peng { tile: Tile::Tong(3) });

        let record = state.record.as_ref().unwrap();
        assert!(record.pending.is_empty());
        assert!(record.collected);
        assert_eq!(record.taken, Some(TakenAction::Peng { tile: Tile::Tong(3) }));
        assert_eq!(state.event(), 5);
    }

    #[test]
    fn test_win_freezes_hand() {
        let mut state = SeatState::new(3);
        state.deal(&[Tile::Wan(1); 2]).unwrap();
        state.record_win(Tile::Wan(1), false, false).unwrap();
        assert!(state.is_out());
        assert_eq!(state.hand.tile_count(Tile::Wan(1)), 3);
        assert!(matches!(
            state.ensure_mutable(false),
            Err(EngineError::HandFrozen { seat: 3, .. })
        ));
        assert!(state.ensure_mutable(true).is_ok());
    }

    #[test]
    fn test_repeat_win_keeps_seat_playing() {
        let mut state = SeatState::new(0);
        state.deal(&[Tile::Wan(1), Tile::Wan(2)]).unwrap();
        state.receive(Tile::Wan(3)).unwrap();
        state.record_win(Tile::Wan(3), true, true).unwrap();
        assert!(!state.is_out());
        assert!(state.won);
        assert_eq!(state.hand.total_count(), 2);
        assert_eq!(state.wins, vec![Tile::Wan(3)]);
    }

    #[test]
    fn test_deal_rejects_fifth_copy() {
        let mut state = SeatState::new(2);
        let err = state.deal(&[Tile::Zi(5); 5]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { seat: Some(2), .. }));
        assert_eq!(state.hand.tile_count(Tile::Zi(5)), 4);
    }

    #[test]
    fn test_win_on_missing_or_fifth_tile_is_rejected() {
        let mut state = SeatState::new(1);
        state.deal(&[Tile::Tong(7); 4]).unwrap();
        let err = state.record_win(Tile::Tong(7), false, false).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { seat: Some(1), .. }));
        assert!(!state.won);

        let err = state.record_win(Tile::Tiao(2), true, true).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientTiles { seat: 1, action: "hu", .. }));
        assert!(state.wins.is_empty());
        assert_eq!(state.hand.total_count(), 4);
    }
}
