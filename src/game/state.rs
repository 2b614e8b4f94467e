use serde::{Deserialize, Serialize};

use crate::game::action::TakenAction;
use crate::game::banker::BankerState;
use crate::game::constants::{EventId, SeatId, NUM_SEATS};
use crate::game::meld::GangKind;
use crate::tile::{Suit, Tile, WinType};

/// 胡牌来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinSource {
    /// 自摸
    SelfDraw,
    /// 杠上开花
    KongFlower,
    /// 点炮
    Discard { from: SeatId },
    /// 抢杠
    RobKong { from: SeatId },
}

/// 胡牌记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub seat: SeatId,
    pub tile: Tile,
    pub source: WinSource,
    pub pattern: WinType,
    pub event: EventId,
}

/// 流局原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// 牌墙摸完
    WallExhausted,
    /// 杠数达到上限且补牌没有胡
    KongLimit,
}

/// 一局的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// 有人胡牌（按胡牌顺序）
    Normal { wins: Vec<WinRecord> },
    /// 流局
    Drawn { reason: DrawReason },
    /// 有人退出
    PlayerQuit { seat: SeatId },
}

/// 弃牌记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardRecord {
    pub seat: SeatId,
    pub tile: Tile,
    pub event: EventId,
}

/// 杠牌记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KongRecord {
    pub seat: SeatId,
    pub tile: Tile,
    pub kind: GangKind,
    pub event: EventId,
    /// 被抢杠
    pub robbed: bool,
}

/// 一局的历史记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub banker: SeatId,
    pub discards: Vec<DiscardRecord>,
    pub kongs: Vec<KongRecord>,
    pub wins: Vec<WinRecord>,
}

/// 发往副作用队列（音效等）的动作通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionNotice {
    pub seat: SeatId,
    /// 动作名（`hu`、`gang`、`peng`、`chi`、`ting`、`throw`……）
    pub action: &'static str,
    pub tile: Option<Tile>,
}

impl ActionNotice {
    pub fn from_action(seat: SeatId, action: &TakenAction) -> Self {
        let tile = match action {
            TakenAction::Hu { tile, .. }
            | TakenAction::Gang { tile, .. }
            | TakenAction::Peng { tile }
            | TakenAction::Throw { tile, .. } => Some(*tile),
            TakenAction::Chi { tiles, position } => tiles.get(*position as usize).copied(),
            TakenAction::Pass => None,
        };
        Self {
            seat,
            action: action.name(),
            tile,
        }
    }
}

/// 牌局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    NotStarted,
    Dealing,
    DeterminingVoidSuits,
    Playing,
    RoundEnding,
    Terminated,
}

/// 一局结束后的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub outcome: RoundOutcome,
    pub record: RoundRecord,
    /// 换庄之后的庄家状态
    pub banker: BankerState,
    pub circle: u32,
}

/// 牌局状态（协调器独占）
#[derive(Debug, Clone)]
pub struct RoundState {
    pub phase: RoundPhase,
    /// 仍在局中的座位
    pub active: [bool; NUM_SEATS as usize],
    pub void_suits: [Option<Suit>; NUM_SEATS as usize],
    pub record: RoundRecord,
    pub outcome: Option<RoundOutcome>,
    /// 本局第一个牌事件编号，更早的上报属于上一局
    pub first_event: EventId,
    next_event: EventId,
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::NotStarted,
            active: [true; NUM_SEATS as usize],
            void_suits: [None; NUM_SEATS as usize],
            record: RoundRecord::default(),
            outcome: None,
            first_event: 1,
            next_event: 1,
        }
    }

    /// 新一局：清空记录，事件编号继续递增
    pub fn begin(&mut self, round: u32, banker: SeatId) {
        let next_event = self.next_event;
        *self = Self::new();
        self.next_event = next_event;
        self.first_event = next_event;
        self.record.round = round;
        self.record.banker = banker;
        self.phase = RoundPhase::Dealing;
    }

    /// 分配新的牌事件编号
    pub fn allocate_event(&mut self) -> EventId {
        let event = self.next_event;
        self.next_event += 1;
        event
    }

    pub fn is_active(&self, seat: SeatId) -> bool {
        self.active.get(seat as usize).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&active| active).count()
    }

    pub fn mark_out(&mut self, seat: SeatId) {
        if let Some(slot) = self.active.get_mut(seat as usize) {
            *slot = false;
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}
