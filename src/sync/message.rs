use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::game::action::Choice;
use crate::game::behavior::Prompt;
use crate::game::constants::SeatId;
use crate::tile::Tile;

/// 节点编号（每个进程一个）
pub type NodeId = u32;

/// 消息类型（固定枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    FourSeatsKnown,
    SeatLocations,
    BankerInfo,
    LiveTileCount,
    WaitingSeat,
    ShownTile,
    StartRound,
    CircleIncrement,
    CheckRemoteState,
    SeatPrompt,
    SeatChoice,
}

/// 节点之间的同步消息
///
/// 所有消息都是幂等的：重复收到同一条消息不会改变结果。
/// 不同类型的消息之间没有顺序保证
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    /// 发送方已知道四个座位
    FourSeatsKnown { node: NodeId },
    /// 座位所在的节点
    SeatLocations {
        node: NodeId,
        locations: Vec<(SeatId, NodeId)>,
    },
    BankerInfo { banker: SeatId, streak: u32 },
    /// 牌墙剩余张数
    LiveTileCount { count: usize },
    /// 正在等待的座位
    WaitingSeat { seat: SeatId },
    /// 亮牌（`None` 表示亮牌已被摸走）
    ShownTile { tile: Option<Tile> },
    /// 新一局，携带权威节点的牌墙顺序
    StartRound {
        round: u32,
        banker: SeatId,
        wall: Vec<Tile>,
    },
    CircleIncrement { circle: u32 },
    /// 请对方重新发送握手状态
    CheckRemoteState { node: NodeId },
    /// 代理座位需要远端做决定
    SeatPrompt { seat: SeatId, prompt: Prompt },
    /// 远端玩家的决定
    SeatChoice { seat: SeatId, choice: Choice },
}

impl SyncMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            SyncMessage::FourSeatsKnown { .. } => MessageType::FourSeatsKnown,
            SyncMessage::SeatLocations { .. } => MessageType::SeatLocations,
            SyncMessage::BankerInfo { .. } => MessageType::BankerInfo,
            SyncMessage::LiveTileCount { .. } => MessageType::LiveTileCount,
            SyncMessage::WaitingSeat { .. } => MessageType::WaitingSeat,
            SyncMessage::ShownTile { .. } => MessageType::ShownTile,
            SyncMessage::StartRound { .. } => MessageType::StartRound,
            SyncMessage::CircleIncrement { .. } => MessageType::CircleIncrement,
            SyncMessage::CheckRemoteState { .. } => MessageType::CheckRemoteState,
            SyncMessage::SeatPrompt { .. } => MessageType::SeatPrompt,
            SyncMessage::SeatChoice { .. } => MessageType::SeatChoice,
        }
    }
}

/// 线上传输的信封
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: NodeId,
    pub message: SyncMessage,
}

impl Envelope {
    pub fn new(from: NodeId, message: SyncMessage) -> Self {
        Self { from, message }
    }

    pub fn encode(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(SyncError::Encode)
    }

    pub fn decode(payload: &str) -> Result<Self, SyncError> {
        serde_json::from_str(payload).map_err(SyncError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::TurnChoice;

    #[test]
    fn test_tagged_wire_format() {
        let envelope = Envelope::new(
            2,
            SyncMessage::BankerInfo {
                banker: 1,
                streak: 3,
            },
        );
        let payload = envelope.encode().unwrap();
        assert!(payload.contains("\"type\":\"banker_info\""));
        assert_eq!(Envelope::decode(&payload).unwrap(), envelope);
    }

    #[test]
    fn test_choice_survives_the_wire() {
        let envelope = Envelope::new(
            1,
            SyncMessage::SeatChoice {
                seat: 3,
                choice: Choice::Turn {
                    turn: TurnChoice::Gang { tile: Tile::Zi(7) },
                },
            },
        );
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded.message.message_type(), MessageType::SeatChoice);
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(matches!(Envelope::decode("seat|3|gang"), Err(SyncError::Decode(_))));
    }
}
