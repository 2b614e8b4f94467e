//! 节点同步
//!
//! 权威节点（持有牌墙的节点）是牌序和出牌顺序的唯一来源，其他节点只镜像回显的状态

pub mod gateway;
pub mod message;
pub mod mirror;
pub mod quorum;

pub use gateway::{ChannelTransport, SyncGateway, Transport};
pub use message::{Envelope, MessageType, NodeId, SyncMessage};
pub use mirror::MirrorState;
pub use quorum::{PeerReadiness, QuorumTracker};
