use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::action::Choice;
use crate::game::behavior::{ProxyBehavior, SeatBehavior, SimpleStrategy};
use crate::game::constants::{SeatId, NUM_SEATS};
use crate::game::coordinator::{Dispatch, RoundCoordinator};
use crate::game::rules::RulesetConfig;
use crate::game::seat::{Seat, SeatCommand};
use crate::game::state::{ActionNotice, RoundPhase, RoundSummary};
use crate::runtime::side_effect::{spawn_side_effects, LoggingSink, SideEffectSink};
use crate::runtime::worker::{CoordinatorInput, SeatEnvelope, SeatWorker, VoidGate};
use crate::sync::gateway::{SyncGateway, Transport};
use crate::sync::message::SyncMessage;

/// 把协调器的输出投递到各个队列
struct Router {
    seats: Vec<UnboundedSender<SeatEnvelope>>,
    sync: Option<UnboundedSender<SyncMessage>>,
    notices: UnboundedSender<ActionNotice>,
}

impl Router {
    fn route(&self, out: Vec<Dispatch>) -> EngineResult<()> {
        for dispatch in out {
            match dispatch {
                Dispatch::Seat { to, command } => {
                    let queue = self.seats.get(to as usize).ok_or(EngineError::MissingCollaborator {
                        seat: Some(to),
                        collaborator: "seat queue",
                    })?;
                    queue.send((to, command)).map_err(|_| EngineError::Cancelled)?;
                }
                Dispatch::Sync(message) => {
                    if let Some(sync) = &self.sync {
                        if sync.send(message).is_err() {
                            debug!("sync gateway gone, message dropped");
                        }
                    }
                }
                Dispatch::Notice(notice) => {
                    if self.notices.send(notice).is_err() {
                        debug!("side-effect queue closed, notice dropped");
                    }
                }
            }
        }
        Ok(())
    }
}

/// 异步牌局运行时
///
/// 一个协调器任务、每个座位一个任务、一个副作用任务，彼此只通过通道通信
pub struct RoundRuntime {
    config: EngineConfig,
    rules: RulesetConfig,
    banker: SeatId,
    behaviors: Vec<Option<Box<dyn SeatBehavior>>>,
    sink: Option<Box<dyn FnOnce(UnboundedReceiver<ActionNotice>) -> JoinHandle<()> + Send>>,
    sync: Option<UnboundedSender<SyncMessage>>,
    /// 握手完成前不发牌
    quorum: Option<watch::Receiver<bool>>,
    /// 远端座位的决定
    remote_choices: Option<(Vec<SeatId>, UnboundedReceiver<(SeatId, Choice)>)>,
    gateway: Option<Box<dyn FnOnce(CancellationToken) -> JoinHandle<()> + Send>>,
}

impl RoundRuntime {
    /// # 参数
    ///
    /// - `config`: 引擎配置（种子、定缺超时）
    /// - `rules`: 玩法配置
    /// - `banker`: 第一局的庄家
    pub fn new(config: EngineConfig, rules: RulesetConfig, banker: SeatId) -> Self {
        Self {
            config,
            rules,
            banker,
            behaviors: (0..NUM_SEATS).map(|_| None).collect(),
            sink: None,
            sync: None,
            quorum: None,
            remote_choices: None,
            gateway: None,
        }
    }

    /// 指定座位的控制方式，未指定的座位使用 `SimpleStrategy`
    pub fn with_behavior(mut self, seat: SeatId, behavior: Box<dyn SeatBehavior>) -> Self {
        if let Some(slot) = self.behaviors.get_mut(seat as usize) {
            *slot = Some(behavior);
        }
        self
    }

    pub fn with_sink<S: SideEffectSink>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(move |notices| spawn_side_effects(sink, notices)));
        self
    }

    /// 同步消息发到这里（通常是 `SyncGateway::run` 的出站通道）
    pub fn with_sync(mut self, sync: UnboundedSender<SyncMessage>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// 接入同步网关（本节点为权威节点）
    ///
    /// 网关任务随运行时启动和取消；位于其他节点的座位改由 `ProxyBehavior` 控制，
    /// 它们的决定经网关回到座位队列；每局发牌前等待握手完成
    pub fn with_gateway<T: Transport + 'static>(mut self, gateway: SyncGateway<T>) -> Self {
        let (sync_tx, sync_rx) = mpsc::unbounded_channel();
        let (choice_tx, choice_rx) = mpsc::unbounded_channel();
        let mut gateway = gateway.with_choices(choice_tx);
        gateway.set_banker(self.banker, 0);

        let remote = gateway.remote_seats();
        for &seat in &remote {
            if let Some(slot) = self.behaviors.get_mut(seat as usize) {
                *slot = Some(Box::new(ProxyBehavior::new(sync_tx.clone())));
            }
        }
        self.quorum = Some(gateway.subscribe_ready());
        self.remote_choices = Some((remote, choice_rx));
        self.sync = Some(sync_tx);

        let poll_interval = self.config.sync_poll_interval();
        self.gateway = Some(Box::new(move |cancel| {
            tokio::spawn(gateway.run(sync_rx, poll_interval, cancel))
        }));
        self
    }

    /// 启动所有任务，连续进行 `rounds` 局（有人退出时提前结束）
    ///
    /// 必须在 tokio 运行时中调用
    pub fn spawn(self, rounds: u32) -> RuntimeHandle {
        let cancel = CancellationToken::new();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let side_effects = match self.sink {
            Some(spawn) => spawn(notice_rx),
            None => spawn_side_effects(LoggingSink, notice_rx),
        };

        let gate = VoidGate::new(self.config.void_suit_timeout(), self.config.void_timeout_policy);
        let mut seat_queues = Vec::with_capacity(NUM_SEATS as usize);
        let mut workers = Vec::with_capacity(NUM_SEATS as usize);
        for (index, behavior) in self.behaviors.into_iter().enumerate() {
            let id = index as SeatId;
            let behavior = behavior.unwrap_or_else(|| Box::new(SimpleStrategy));
            let (tx, rx) = mpsc::unbounded_channel();
            let worker = SeatWorker::new(Seat::new(id, behavior), rx, input_tx.clone(), gate, cancel.clone());
            workers.push(tokio::spawn(worker.run()));
            seat_queues.push(tx);
        }

        let mut background = Vec::new();
        if let Some(spawn) = self.gateway {
            background.push(spawn(cancel.clone()));
        }
        if let Some((remote, choices)) = self.remote_choices {
            background.push(tokio::spawn(forward_choices(
                choices,
                remote,
                seat_queues.clone(),
                cancel.clone(),
            )));
        }

        let router = Router {
            seats: seat_queues.clone(),
            sync: self.sync,
            notices: notice_tx,
        };
        let coordinator = RoundCoordinator::new(self.rules, self.banker);
        let coordinator = tokio::spawn(run_coordinator(
            coordinator,
            rounds,
            self.config.seed,
            self.quorum,
            input_rx,
            router,
            cancel.clone(),
        ));

        info!(rounds, banker = self.banker, "round runtime started");
        RuntimeHandle {
            inputs: input_tx,
            seats: seat_queues,
            cancel,
            coordinator,
            workers,
            background,
            side_effects,
        }
    }
}

/// 运行中的牌局
pub struct RuntimeHandle {
    inputs: UnboundedSender<CoordinatorInput>,
    seats: Vec<UnboundedSender<SeatEnvelope>>,
    cancel: CancellationToken,
    coordinator: JoinHandle<EngineResult<Vec<RoundSummary>>>,
    workers: Vec<JoinHandle<()>>,
    /// 网关和远端决定转发
    background: Vec<JoinHandle<()>>,
    side_effects: JoinHandle<()>,
}

impl RuntimeHandle {
    /// 把界面或远端的决定放进座位队列
    pub fn submit(&self, seat: SeatId, choice: Choice) -> EngineResult<()> {
        let queue = self.seats.get(seat as usize).ok_or(EngineError::MissingCollaborator {
            seat: Some(seat),
            collaborator: "seat queue",
        })?;
        queue
            .send((seat, SeatCommand::Submit { choice }))
            .map_err(|_| EngineError::Cancelled)
    }

    /// 玩家退出：本局以 `PlayerQuit` 结束
    pub fn quit(&self, seat: SeatId) -> EngineResult<()> {
        self.inputs
            .send(CoordinatorInput::Quit(seat))
            .map_err(|_| EngineError::Cancelled)
    }

    /// 立即取消所有任务
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 等待所有任务结束，返回已完成各局的结算
    pub async fn join(self) -> EngineResult<Vec<RoundSummary>> {
        let result = match self.coordinator.await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "coordinator task aborted");
                Err(EngineError::Cancelled)
            }
        };

        self.cancel.cancel();
        for worker in self.workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "seat worker aborted");
            }
        }
        for task in self.background {
            if let Err(err) = task.await {
                warn!(error = %err, "sync task aborted");
            }
        }
        drop(self.inputs);
        if let Err(err) = self.side_effects.await {
            warn!(error = %err, "side-effect task aborted");
        }
        result
    }
}

async fn next_input(
    inputs: &mut UnboundedReceiver<CoordinatorInput>,
    cancel: &CancellationToken,
) -> EngineResult<CoordinatorInput> {
    tokio::select! {
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        input = inputs.recv() => input.ok_or(EngineError::Cancelled),
    }
}

/// 把远端节点的决定放进对应座位的队列，本地座位的决定不接受
async fn forward_choices(
    mut choices: UnboundedReceiver<(SeatId, Choice)>,
    remote: Vec<SeatId>,
    seats: Vec<UnboundedSender<SeatEnvelope>>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = choices.recv() => next,
        };
        let Some((seat, choice)) = next else {
            break;
        };
        if !remote.contains(&seat) {
            warn!(seat, "choice for a local seat from a remote node dropped");
            continue;
        }
        match seats.get(seat as usize) {
            Some(queue) => {
                if queue.send((seat, SeatCommand::Submit { choice })).is_err() {
                    debug!(seat, "seat queue closed, remote choice dropped");
                }
            }
            None => warn!(seat, "choice for an unknown seat dropped"),
        }
    }
}

/// 等待所有远端节点握手完成
async fn await_quorum(quorum: &mut Option<watch::Receiver<bool>>, cancel: &CancellationToken) -> EngineResult<()> {
    let Some(quorum) = quorum else {
        return Ok(());
    };
    let mut logged = false;
    loop {
        if *quorum.borrow_and_update() {
            return Ok(());
        }
        if !logged {
            info!("waiting on peers before dealing");
            logged = true;
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            changed = quorum.changed() => changed.map_err(|_| EngineError::MissingCollaborator {
                seat: None,
                collaborator: "sync gateway",
            })?,
        }
    }
}

/// 协调器任务：顺序处理座位上报和退出请求
async fn run_coordinator(
    mut coordinator: RoundCoordinator,
    rounds: u32,
    seed: Option<u64>,
    mut quorum: Option<watch::Receiver<bool>>,
    mut inputs: UnboundedReceiver<CoordinatorInput>,
    router: Router,
    cancel: CancellationToken,
) -> EngineResult<Vec<RoundSummary>> {
    let mut summaries = Vec::new();
    let result: EngineResult<()> = async {
        for index in 0..rounds {
            await_quorum(&mut quorum, &cancel).await?;
            let wall = coordinator.fresh_wall(seed.map(|seed| seed.wrapping_add(u64::from(index))));
            router.route(coordinator.start_round(wall)?)?;

            let mut quit = false;
            while coordinator.phase() != RoundPhase::RoundEnding {
                match next_input(&mut inputs, &cancel).await? {
                    CoordinatorInput::Report(report) => router.route(coordinator.handle_report(report)?)?,
                    CoordinatorInput::Quit(seat) => {
                        router.route(coordinator.quit(seat)?)?;
                        quit = true;
                    }
                    CoordinatorInput::Failed(err) => return Err(err),
                }
            }

            let (summary, out) = coordinator.finish_round()?;
            router.route(out)?;
            info!(round = summary.round, outcome = ?summary.outcome, "round finished");
            summaries.push(summary);
            if quit {
                break;
            }
        }
        Ok(())
    }
    .await;

    coordinator.terminate();
    // 释放所有座位队列（包括等待定缺的座位）
    cancel.cancel();
    result.map(|()| summaries)
}
