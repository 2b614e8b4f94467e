use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::game::action::Choice;
use crate::game::behavior::{PresentationEvent, Prompt};
use crate::game::constants::SeatId;
use crate::sync::message::{Envelope, NodeId, SyncMessage};
use crate::sync::mirror::MirrorState;
use crate::sync::quorum::QuorumTracker;

/// 原始传输（字节帧由外部负责）
pub trait Transport: Send {
    fn send(&mut self, payload: String) -> Result<(), SyncError>;

    /// 非阻塞地取一条消息
    fn try_recv(&mut self) -> Result<Option<String>, SyncError>;
}

/// 进程内通道传输（测试和单机多节点）
pub struct ChannelTransport {
    outbound: UnboundedSender<String>,
    inbound: UnboundedReceiver<String>,
}

impl ChannelTransport {
    pub fn new(outbound: UnboundedSender<String>, inbound: UnboundedReceiver<String>) -> Self {
        Self { outbound, inbound }
    }

    /// 一对互相连接的传输
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, payload: String) -> Result<(), SyncError> {
        self.outbound.send(payload).map_err(|_| SyncError::ChannelClosed)
    }

    fn try_recv(&mut self) -> Result<Option<String>, SyncError> {
        match self.inbound.try_recv() {
            Ok(payload) => Ok(Some(payload)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SyncError::ChannelClosed),
        }
    }
}

/// 同步网关
///
/// 把协调器和座位的事件编码后发给其他节点，并处理收到的消息：
/// 更新握手状态、更新镜像（非权威节点）、转发远端玩家的决定。
/// 传输错误只作为提示发给表现层，不影响进行中的牌局
pub struct SyncGateway<T: Transport> {
    node: NodeId,
    authoritative: bool,
    transport: T,
    quorum: QuorumTracker,
    /// 握手是否完成，权威节点的运行时据此决定何时发牌
    ready: watch::Sender<bool>,
    mirror: MirrorState,
    locations: Vec<(SeatId, NodeId)>,
    banker: Option<(SeatId, u32)>,
    presentation: Option<UnboundedSender<PresentationEvent>>,
    choices: Option<UnboundedSender<(SeatId, Choice)>>,
    prompts: Option<UnboundedSender<(SeatId, Prompt)>>,
}

impl<T: Transport> SyncGateway<T> {
    /// # 参数
    ///
    /// - `node`: 本节点
    /// - `authoritative`: 是否为权威节点（持有牌墙）
    /// - `transport`: 传输
    /// - `locations`: 每个座位所在的节点
    pub fn new(node: NodeId, authoritative: bool, transport: T, locations: Vec<(SeatId, NodeId)>) -> Self {
        let quorum = QuorumTracker::new(node, locations.iter().map(|&(_, owner)| owner));
        let (ready, _) = watch::channel(quorum.is_ready());
        Self {
            node,
            authoritative,
            transport,
            quorum,
            ready,
            mirror: MirrorState::new(),
            locations,
            banker: None,
            presentation: None,
            choices: None,
            prompts: None,
        }
    }

    pub fn with_presentation(mut self, events: UnboundedSender<PresentationEvent>) -> Self {
        self.presentation = Some(events);
        self
    }

    /// 远端玩家的决定转发到这里
    pub fn with_choices(mut self, choices: UnboundedSender<(SeatId, Choice)>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// 本节点座位的提示转发到这里
    pub fn with_prompts(mut self, prompts: UnboundedSender<(SeatId, Prompt)>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub fn is_ready(&self) -> bool {
        self.quorum.is_ready()
    }

    pub fn quorum(&self) -> &QuorumTracker {
        &self.quorum
    }

    /// 订阅握手状态
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// 位于其他节点的座位
    pub fn remote_seats(&self) -> Vec<SeatId> {
        self.locations
            .iter()
            .filter(|&&(_, owner)| owner != self.node)
            .map(|&(seat, _)| seat)
            .collect()
    }

    pub fn mirror(&self) -> &MirrorState {
        &self.mirror
    }

    pub fn set_banker(&mut self, banker: SeatId, streak: u32) {
        self.banker = Some((banker, streak));
    }

    fn is_local(&self, seat: SeatId) -> bool {
        self.locations
            .iter()
            .any(|&(s, owner)| s == seat && owner == self.node)
    }

    /// 发送一条消息，失败时向表现层提示
    pub fn publish(&mut self, message: SyncMessage) -> bool {
        if let SyncMessage::BankerInfo { banker, streak } = message {
            self.banker = Some((banker, streak));
        }
        let result = Envelope::new(self.node, message)
            .encode()
            .and_then(|payload| self.transport.send(payload));
        match result {
            Ok(()) => true,
            Err(err) => {
                self.advise(&err);
                false
            }
        }
    }

    /// 发送本节点的握手状态
    pub fn announce(&mut self) {
        self.publish(SyncMessage::FourSeatsKnown { node: self.node });
        self.publish(SyncMessage::SeatLocations {
            node: self.node,
            locations: self.locations.clone(),
        });
        if let Some((banker, streak)) = self.banker {
            self.publish(SyncMessage::BankerInfo { banker, streak });
        }
    }

    /// 处理所有已到达的消息，返回解码成功的消息
    pub fn poll(&mut self) -> Vec<SyncMessage> {
        let mut received = Vec::new();
        loop {
            match self.transport.try_recv() {
                Ok(Some(payload)) => match Envelope::decode(&payload) {
                    Ok(envelope) => {
                        self.handle_inbound(&envelope);
                        received.push(envelope.message);
                    }
                    Err(err) => self.advise(&err),
                },
                Ok(None) => break,
                Err(err) => {
                    self.advise(&err);
                    break;
                }
            }
        }

        let ready = self.quorum.is_ready();
        self.ready.send_if_modified(|current| {
            let changed = *current != ready;
            *current = ready;
            changed
        });
        received
    }

    fn handle_inbound(&mut self, envelope: &Envelope) {
        if envelope.from == self.node {
            return;
        }
        self.quorum.observe(envelope);
        if !self.authoritative {
            self.mirror.apply(&envelope.message);
        }

        match &envelope.message {
            SyncMessage::CheckRemoteState { node } if *node == self.node => {
                debug!(node = self.node, from = envelope.from, "state re-requested");
                self.announce();
            }
            SyncMessage::BankerInfo { banker, streak } if !self.authoritative => {
                self.banker = Some((*banker, *streak));
            }
            SyncMessage::SeatChoice { seat, choice } => {
                if let Some(choices) = &self.choices {
                    if choices.send((*seat, *choice)).is_err() {
                        warn!(seat = *seat, "choice receiver gone");
                    }
                }
            }
            SyncMessage::SeatPrompt { seat, prompt } if self.is_local(*seat) => {
                if let Some(prompts) = &self.prompts {
                    if prompts.send((*seat, prompt.clone())).is_err() {
                        warn!(seat = *seat, "prompt receiver gone");
                    }
                }
            }
            _ => {}
        }
    }

    /// 一次轮询：握手未完成时重新请求，并提示表现层
    pub fn tick(&mut self) {
        if self.quorum.is_ready() {
            return;
        }
        for request in self.quorum.poll_requests() {
            self.publish(request);
        }
        let missing = self.quorum.missing();
        debug!(node = self.node, ?missing, "waiting on peers");
        self.present(PresentationEvent::WaitingOnPeers { missing });
    }

    fn advise(&self, err: &SyncError) {
        warn!(node = self.node, error = %err, "sync advisory");
        self.present(PresentationEvent::Advisory {
            message: err.to_string(),
        });
    }

    fn present(&self, event: PresentationEvent) {
        if let Some(presentation) = &self.presentation {
            if presentation.send(event).is_err() {
                debug!(node = self.node, "presentation layer gone");
            }
        }
    }
}

impl<T: Transport + 'static> SyncGateway<T> {
    /// 网关任务：转发出站消息，按间隔轮询入站消息和握手状态
    pub async fn run(mut self, mut outbound: UnboundedReceiver<SyncMessage>, poll_interval: Duration, cancel: CancellationToken) {
        info!(node = self.node, authoritative = self.authoritative, "sync gateway started");
        self.announce();
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                message = outbound.recv() => match message {
                    Some(message) => {
                        self.publish(message);
                    }
                    None => break,
                },
                _ = interval.tick() => {
                    self.poll();
                    self.tick();
                }
            }
        }
        info!(node = self.node, "sync gateway stopped");
    }
}
