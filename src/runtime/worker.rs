use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::VoidTimeoutPolicy;
use crate::error::{EngineError, EngineResult};
use crate::game::constants::SeatId;
use crate::game::seat::{Seat, SeatCommand, SeatReport};

/// 座位队列中的一条命令（带目标座位，用于检查投递是否正确）
pub type SeatEnvelope = (SeatId, SeatCommand);

/// 发给协调器任务的输入
#[derive(Debug)]
pub enum CoordinatorInput {
    Report(SeatReport),
    Quit(SeatId),
    /// 座位任务出错退出
    Failed(EngineError),
}

/// 定缺闸门
///
/// 座位在定缺前收到的牌事件会被推迟；推迟开始后计时，
/// 超时按策略处理
#[derive(Debug, Clone, Copy)]
pub struct VoidGate {
    timeout: Duration,
    policy: VoidTimeoutPolicy,
    deadline: Option<Instant>,
}

impl VoidGate {
    pub fn new(timeout: Duration, policy: VoidTimeoutPolicy) -> Self {
        Self {
            timeout,
            policy,
            deadline: None,
        }
    }

    /// 根据座位状态打开或关闭闸门，返回截止时间
    fn arm(&mut self, seat: &Seat) -> Option<Instant> {
        if seat.is_void_pending() && seat.has_deferred() {
            let timeout = self.timeout;
            Some(*self.deadline.get_or_insert_with(|| Instant::now() + timeout))
        } else {
            self.deadline = None;
            None
        }
    }
}

/// 座位任务
///
/// 每个座位一个顺序队列：同一座位的手牌修改串行执行，不同座位互不阻塞
pub struct SeatWorker {
    seat: Seat,
    inbox: UnboundedReceiver<SeatEnvelope>,
    coordinator: UnboundedSender<CoordinatorInput>,
    gate: VoidGate,
    cancel: CancellationToken,
}

impl SeatWorker {
    pub fn new(
        seat: Seat,
        inbox: UnboundedReceiver<SeatEnvelope>,
        coordinator: UnboundedSender<CoordinatorInput>,
        gate: VoidGate,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            seat,
            inbox,
            coordinator,
            gate,
            cancel,
        }
    }

    pub async fn run(mut self) {
        let seat = self.seat.id();
        debug!(seat, "seat worker started");
        if let Err(err) = self.process().await {
            error!(seat, error = %err, "seat worker failed");
            if self.coordinator.send(CoordinatorInput::Failed(err)).is_err() {
                debug!(seat, "coordinator gone");
            }
        }
        debug!(seat, "seat worker stopped");
    }

    async fn process(&mut self) -> EngineResult<()> {
        loop {
            let deadline = self.gate.arm(&self.seat);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                message = self.inbox.recv() => match message {
                    Some((target, command)) => self.handle(target, command)?,
                    None => return Ok(()),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_gate_timeout()?;
                }
            }
        }
    }

    fn handle(&mut self, target: SeatId, command: SeatCommand) -> EngineResult<()> {
        let submitted = matches!(command, SeatCommand::Submit { .. });
        match self.seat.handle(target, command) {
            Ok(reports) => self.forward(reports),
            // 界面给出的非法决定不改变状态，座位继续等待
            Err(err @ (EngineError::ActionNotPending { .. } | EngineError::IllegalThrow { .. })) if submitted => {
                warn!(seat = self.seat.id(), error = %err, "choice rejected");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn on_gate_timeout(&mut self) -> EngineResult<()> {
        let seat = self.seat.id();
        match self.gate.policy {
            VoidTimeoutPolicy::Fail => Err(EngineError::VoidSuitTimeout {
                seat,
                waited_ms: u64::try_from(self.gate.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            VoidTimeoutPolicy::AutoDeclare => {
                warn!(seat, "void suit not declared in time, choosing automatically");
                let reports = self.seat.auto_declare_void_suit()?;
                self.forward(reports)
            }
        }
    }

    fn forward(&self, reports: Vec<SeatReport>) -> EngineResult<()> {
        for report in reports {
            self.coordinator
                .send(CoordinatorInput::Report(report))
                .map_err(|_| EngineError::Cancelled)?;
        }
        Ok(())
    }
}
