use tracing::debug;

use crate::game::constants::SeatId;
use crate::sync::message::{NodeId, SyncMessage};
use crate::tile::Tile;

/// 非权威节点对牌局的镜像
///
/// 只记录权威节点回显的状态，从不自行决定牌序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorState {
    pub round: u32,
    pub banker: Option<SeatId>,
    pub streak: u32,
    pub circle: u32,
    pub live_tiles: usize,
    pub waiting_seat: Option<SeatId>,
    pub shown_tile: Option<Tile>,
    /// 权威节点的牌墙顺序
    pub wall: Vec<Tile>,
    pub locations: Vec<(SeatId, NodeId)>,
}

impl MirrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用一条消息，返回镜像是否发生变化
    pub fn apply(&mut self, message: &SyncMessage) -> bool {
        let before = self.clone();
        match message {
            SyncMessage::SeatLocations { locations, .. } => {
                let mut locations = locations.clone();
                locations.sort_unstable();
                self.locations = locations;
            }
            SyncMessage::BankerInfo { banker, streak } => {
                self.banker = Some(*banker);
                self.streak = *streak;
            }
            SyncMessage::LiveTileCount { count } => self.live_tiles = *count,
            SyncMessage::WaitingSeat { seat } => self.waiting_seat = Some(*seat),
            SyncMessage::ShownTile { tile } => self.shown_tile = *tile,
            SyncMessage::StartRound { round, banker, wall } => {
                self.round = *round;
                self.banker = Some(*banker);
                self.wall = wall.clone();
                self.live_tiles = wall.len();
                self.waiting_seat = None;
            }
            // 圈数只增不减，重复或乱序的消息不会回退
            SyncMessage::CircleIncrement { circle } => self.circle = self.circle.max(*circle),
            SyncMessage::FourSeatsKnown { .. }
            | SyncMessage::CheckRemoteState { .. }
            | SyncMessage::SeatPrompt { .. }
            | SyncMessage::SeatChoice { .. } => {}
        }
        let changed = *self != before;
        if changed {
            debug!(message = ?message.message_type(), "mirror updated");
        }
        changed
    }
}
