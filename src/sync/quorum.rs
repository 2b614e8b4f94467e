use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::sync::message::{Envelope, NodeId, SyncMessage};

/// 一个远端节点的握手状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerReadiness {
    /// 对方已知道四个座位
    pub seats_known: bool,
    /// 对方已知道座位所在节点
    pub locations_known: bool,
    /// 对方已知道庄家
    pub banker_known: bool,
}

impl PeerReadiness {
    pub fn is_ready(&self) -> bool {
        self.seats_known && self.locations_known && self.banker_known
    }
}

/// 启动握手
///
/// 尽力而为的存活检查，不是共识协议：每个远端节点有三个独立的标志，
/// 全部为真后权威节点才能开始出牌。缺失的标志靠轮询 `CheckRemoteState` 重新请求
#[derive(Debug, Clone)]
pub struct QuorumTracker {
    local: NodeId,
    peers: BTreeMap<NodeId, PeerReadiness>,
}

impl QuorumTracker {
    pub fn new(local: NodeId, peers: impl IntoIterator<Item = NodeId>) -> Self {
        let peers = peers
            .into_iter()
            .filter(|&node| node != local)
            .map(|node| (node, PeerReadiness::default()))
            .collect();
        Self { local, peers }
    }

    pub fn local(&self) -> NodeId {
        self.local
    }

    pub fn peer(&self, node: NodeId) -> Option<PeerReadiness> {
        self.peers.get(&node).copied()
    }

    /// 记录收到的消息，返回是否有标志发生变化
    pub fn observe(&mut self, envelope: &Envelope) -> bool {
        let Some(peer) = self.peers.get_mut(&envelope.from) else {
            return false;
        };
        let before = *peer;
        match &envelope.message {
            SyncMessage::FourSeatsKnown { .. } => peer.seats_known = true,
            SyncMessage::SeatLocations { .. } => peer.locations_known = true,
            SyncMessage::BankerInfo { .. } => peer.banker_known = true,
            _ => {}
        }
        let changed = before != *peer;
        if changed {
            debug!(peer = envelope.from, readiness = ?peer, "peer readiness changed");
            if peer.is_ready() {
                info!(peer = envelope.from, "peer ready");
            }
        }
        changed
    }

    /// 远端断开后重新握手
    pub fn reset_peer(&mut self, node: NodeId) {
        if let Some(peer) = self.peers.get_mut(&node) {
            *peer = PeerReadiness::default();
            info!(peer = node, "peer readiness reset");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.peers.values().all(PeerReadiness::is_ready)
    }

    /// 握手未完成的节点
    pub fn missing(&self) -> Vec<NodeId> {
        self.peers
            .iter()
            .filter(|(_, readiness)| !readiness.is_ready())
            .map(|(&node, _)| node)
            .collect()
    }

    /// 本轮需要发送的轮询请求
    pub fn poll_requests(&self) -> Vec<SyncMessage> {
        self.missing()
            .into_iter()
            .map(|node| SyncMessage::CheckRemoteState { node })
            .collect()
    }
}
