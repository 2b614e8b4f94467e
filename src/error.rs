use thiserror::Error;

use crate::config::ConfigError;
use crate::game::constants::{EventId, SeatId};
use crate::tile::Tile;

/// 引擎内部错误
///
/// 这些错误都意味着规则引擎本身的缺陷（错误的队列、缺少协作者、
/// 请求了不存在的候选动作……），出现后立即向上传播，不尝试恢复。
/// 每个变体都带有座位、牌事件和动作信息，便于复现。
///
/// 牌墙摸完、杠数达到上限等规则边界属于正常结局，不在此列
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("wrong queue: command `{command}` for seat {target} delivered to seat {queue}")]
    WrongQueue {
        target: SeatId,
        queue: SeatId,
        command: &'static str,
    },
    #[error("missing collaborator `{collaborator}` (seat {seat:?})")]
    MissingCollaborator {
        seat: Option<SeatId>,
        collaborator: &'static str,
    },
    #[error("seat {seat}, event {event}: action `{action}` is not pending")]
    ActionNotPending {
        seat: SeatId,
        event: EventId,
        action: String,
    },
    #[error("seat {seat}, event {event}: `{action}` on {tile} needs {needed} concealed, holds {held}")]
    InsufficientTiles {
        seat: SeatId,
        event: EventId,
        action: &'static str,
        tile: Tile,
        needed: u8,
        held: u8,
    },
    #[error("seat {seat}, event {event}: cannot throw {tile}: {reason}")]
    IllegalThrow {
        seat: SeatId,
        event: EventId,
        tile: Tile,
        reason: &'static str,
    },
    #[error("seat {seat}, event {event}: hand is frozen after a win")]
    HandFrozen { seat: SeatId, event: EventId },
    #[error("unexpected report from seat {seat} (event {event:?}): {detail}")]
    UnexpectedReport {
        seat: SeatId,
        event: Option<EventId>,
        detail: String,
    },
    #[error("seat {seat}: void suit not declared within {waited_ms} ms")]
    VoidSuitTimeout { seat: SeatId, waited_ms: u64 },
    #[error("invalid phase (seat {seat:?}): expected {expected}, was {actual}")]
    InvalidPhase {
        seat: Option<SeatId>,
        expected: &'static str,
        actual: String,
    },
    #[error("round cancelled")]
    Cancelled,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 同步/传输错误
///
/// 只作为提示上报给表现层，从不终止进行中的牌局
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to encode sync message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode sync message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("sync channel closed")]
    ChannelClosed,
}

pub type EngineResult<T> = Result<T, EngineError>;
