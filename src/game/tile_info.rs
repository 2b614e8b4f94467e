use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::{EventId, SeatId};
use crate::tile::Tile;

/// 牌的来源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileOrigin {
    /// 从牌墙摸到
    New,
    /// 被打出
    Thrown,
    /// 通过吃碰杠获得（包括被加杠的牌）
    Claimed,
}

/// 一张牌在一个牌事件中的经历
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInfo {
    pub event: EventId,
    pub tile: Tile,
    /// 来源座位
    pub origin_seat: SeatId,
    pub origin: TileOrigin,
    /// 杠后补牌：产生这张补牌的杠
    pub kong_link: Option<Tile>,
    /// 最终去向
    pub destination: Option<SeatId>,
    /// 胡这张牌的座位（按声明顺序，一炮多响时有多个）
    pub winners: SmallVec<[SeatId; 3]>,
}

impl TileInfo {
    pub fn new(event: EventId, tile: Tile, origin_seat: SeatId, origin: TileOrigin) -> Self {
        Self {
            event,
            tile,
            origin_seat,
            origin,
            kong_link: None,
            destination: None,
            winners: SmallVec::new(),
        }
    }

    /// 杠后补牌
    pub fn replacement(event: EventId, tile: Tile, seat: SeatId, kong: Tile) -> Self {
        Self {
            kong_link: Some(kong),
            ..Self::new(event, tile, seat, TileOrigin::New)
        }
    }

    pub fn is_kong_replacement(&self) -> bool {
        self.kong_link.is_some()
    }

    pub fn add_winner(&mut self, seat: SeatId) {
        if !self.winners.contains(&seat) {
            self.winners.push(seat);
        }
    }
}
