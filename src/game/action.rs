use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::meld::GangKind;
use crate::tile::{Suit, Tile, WinType};
use crate::utils::TileKindSet;

/// 可被仲裁的动作种类（按优先级从高到低）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// 胡
    Hu,
    /// 杠
    Gang,
    /// 碰
    Peng,
    /// 吃
    Chi,
}

impl ActionKind {
    /// 优先级顺序：胡 > 杠 > 碰 > 吃
    pub const PRIORITY: [ActionKind; 4] = [ActionKind::Hu, ActionKind::Gang, ActionKind::Peng, ActionKind::Chi];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Hu => "hu",
            ActionKind::Gang => "gang",
            ActionKind::Peng => "peng",
            ActionKind::Chi => "chi",
        };
        f.write_str(name)
    }
}

/// 摸牌后的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnChoice {
    /// 自摸
    Hu,
    /// 暗杠或加杠
    Gang { tile: Tile },
    /// 报听并打出 `discard`
    Ting { discard: Tile },
    /// 不做动作（接着出牌）
    Pass,
}

/// 对别人打出的牌（或加杠的牌）的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimChoice {
    Hu,
    Gang,
    Peng,
    /// 吃，`position` 为被吃的牌在顺子中的位置
    Chi { position: u8 },
    Pass,
}

impl ClaimChoice {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ClaimChoice::Hu => Some(ActionKind::Hu),
            ClaimChoice::Gang => Some(ActionKind::Gang),
            ClaimChoice::Peng => Some(ActionKind::Peng),
            ClaimChoice::Chi { .. } => Some(ActionKind::Chi),
            ClaimChoice::Pass => None,
        }
    }
}

/// 座位收到的决定（来自行为策略、界面或远端）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum Choice {
    VoidSuit { suit: Suit },
    Turn { turn: TurnChoice },
    Throw { tile: Tile },
    Claim { claim: ClaimChoice },
}

/// 已执行的动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TakenAction {
    /// 胡牌，`self_drawn` 为自摸
    Hu {
        tile: Tile,
        self_drawn: bool,
        pattern: WinType,
    },
    Gang { tile: Tile, kind: GangKind },
    Peng { tile: Tile },
    Chi { tiles: [Tile; 3], position: u8 },
    /// 出牌；报听时 `waits` 为听的牌
    Throw { tile: Tile, waits: Option<TileKindSet> },
    Pass,
}

impl TakenAction {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            TakenAction::Hu { .. } => Some(ActionKind::Hu),
            TakenAction::Gang { .. } => Some(ActionKind::Gang),
            TakenAction::Peng { .. } => Some(ActionKind::Peng),
            TakenAction::Chi { .. } => Some(ActionKind::Chi),
            TakenAction::Throw { .. } | TakenAction::Pass => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TakenAction::Hu { .. } => "hu",
            TakenAction::Gang { .. } => "gang",
            TakenAction::Peng { .. } => "peng",
            TakenAction::Chi { .. } => "chi",
            TakenAction::Throw { waits: Some(_), .. } => "ting",
            TakenAction::Throw { .. } => "throw",
            TakenAction::Pass => "pass",
        }
    }
}
