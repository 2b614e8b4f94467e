use std::collections::VecDeque;

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::game::action::Choice;
use crate::game::behavior::{SeatBehavior, SimpleStrategy};
use crate::game::constants::{SeatId, NUM_SEATS};
use crate::game::coordinator::{Dispatch, RoundCoordinator};
use crate::game::rules::RulesetConfig;
use crate::game::seat::{Seat, SeatCommand, SeatReport};
use crate::game::state::{ActionNotice, RoundOutcome, RoundPhase, RoundSummary};
use crate::sync::message::SyncMessage;
use crate::tile::Wall;

/// 驱动器停下来的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverStatus {
    /// 这些座位在等待界面或远端的决定
    AwaitingInput { seats: SmallVec<[SeatId; 4]> },
    RoundOver(RoundOutcome),
}

/// 单线程驱动器
///
/// 按先进先出顺序投递命令，直到所有队列清空。
/// 和异步运行时走同一套状态机，适合测试、回放和脚本对局
pub struct RoundDriver {
    coordinator: RoundCoordinator,
    seats: [Option<Seat>; NUM_SEATS as usize],
    queue: VecDeque<(SeatId, SeatCommand)>,
    synced: Vec<SyncMessage>,
    notices: Vec<ActionNotice>,
}

impl RoundDriver {
    pub fn new(config: RulesetConfig, banker: SeatId) -> Self {
        Self {
            coordinator: RoundCoordinator::new(config, banker),
            seats: [None, None, None, None],
            queue: VecDeque::new(),
            synced: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// 四家都由 `SimpleStrategy` 控制
    pub fn scripted(config: RulesetConfig, banker: SeatId) -> Self {
        let mut driver = Self::new(config, banker);
        for seat in 0..NUM_SEATS {
            driver.set_behavior(seat, Box::new(SimpleStrategy));
        }
        driver
    }

    /// 安放座位（按座位号）
    pub fn with_seat(mut self, seat: Seat) -> Self {
        let index = seat.id() as usize;
        if let Some(slot) = self.seats.get_mut(index) {
            *slot = Some(seat);
        }
        self
    }

    pub fn set_behavior(&mut self, seat: SeatId, behavior: Box<dyn SeatBehavior>) {
        if let Some(slot) = self.seats.get_mut(seat as usize) {
            *slot = Some(Seat::new(seat, behavior));
        }
    }

    pub fn coordinator(&self) -> &RoundCoordinator {
        &self.coordinator
    }

    pub fn seat(&self, seat: SeatId) -> Option<&Seat> {
        self.seats.get(seat as usize).and_then(Option::as_ref)
    }

    /// 取走累积的同步消息
    pub fn take_sync(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.synced)
    }

    /// 取走累积的动作通知
    pub fn take_notices(&mut self) -> Vec<ActionNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn start_round(&mut self, wall: Wall) -> EngineResult<DriverStatus> {
        let out = self.coordinator.start_round(wall)?;
        self.absorb(out);
        self.run()
    }

    /// 把界面或远端的决定交给座位
    pub fn submit(&mut self, seat: SeatId, choice: Choice) -> EngineResult<DriverStatus> {
        let reports = self.seat_mut(seat)?.submit(choice)?;
        self.forward(reports)?;
        self.run()
    }

    pub fn quit(&mut self, seat: SeatId) -> EngineResult<DriverStatus> {
        let out = self.coordinator.quit(seat)?;
        self.absorb(out);
        self.run()
    }

    pub fn finish_round(&mut self) -> EngineResult<RoundSummary> {
        let (summary, out) = self.coordinator.finish_round()?;
        self.absorb(out);
        info!(
            round = summary.round,
            outcome = ?summary.outcome,
            banker = summary.banker.seat,
            streak = summary.banker.streak,
            "round finished"
        );
        Ok(summary)
    }

    /// 打完一局（所有座位都必须能立即做决定）
    pub fn play_round(&mut self, wall: Wall) -> EngineResult<RoundSummary> {
        match self.start_round(wall)? {
            DriverStatus::RoundOver(_) => self.finish_round(),
            DriverStatus::AwaitingInput { seats } => Err(EngineError::InvalidPhase {
                seat: seats.first().copied(),
                expected: "seats that decide immediately",
                actual: format!("waiting for input from seats {seats:?}"),
            }),
        }
    }

    /// 连续打多局，庄家和圈数跨局保留
    ///
    /// 给定种子时第 n 局使用 `seed + n` 洗牌
    pub fn play_rounds(&mut self, rounds: u32, seed: Option<u64>) -> EngineResult<Vec<RoundSummary>> {
        let mut summaries = Vec::with_capacity(rounds as usize);
        for index in 0..rounds {
            let wall = self
                .coordinator
                .fresh_wall(seed.map(|seed| seed.wrapping_add(u64::from(index))));
            summaries.push(self.play_round(wall)?);
        }
        Ok(summaries)
    }

    fn seat_mut(&mut self, seat: SeatId) -> EngineResult<&mut Seat> {
        self.seats
            .get_mut(seat as usize)
            .and_then(Option::as_mut)
            .ok_or(EngineError::MissingCollaborator {
                seat: Some(seat),
                collaborator: "seat",
            })
    }

    fn absorb(&mut self, out: Vec<Dispatch>) {
        for dispatch in out {
            match dispatch {
                Dispatch::Seat { to, command } => self.queue.push_back((to, command)),
                Dispatch::Sync(message) => self.synced.push(message),
                Dispatch::Notice(notice) => {
                    debug!(seat = notice.seat, action = notice.action, tile = ?notice.tile, "action");
                    self.notices.push(notice);
                }
            }
        }
    }

    fn forward(&mut self, reports: Vec<SeatReport>) -> EngineResult<()> {
        for report in reports {
            let out = self.coordinator.handle_report(report)?;
            self.absorb(out);
        }
        Ok(())
    }

    fn run(&mut self) -> EngineResult<DriverStatus> {
        while let Some((to, command)) = self.queue.pop_front() {
            let reports = self.seat_mut(to)?.handle(to, command)?;
            self.forward(reports)?;
        }
        Ok(self.status())
    }

    fn status(&self) -> DriverStatus {
        if self.coordinator.phase() == RoundPhase::RoundEnding {
            if let Some(outcome) = self.coordinator.outcome() {
                return DriverStatus::RoundOver(outcome.clone());
            }
        }
        let seats = self
            .seats
            .iter()
            .flatten()
            .filter(|seat| seat.awaiting().is_some())
            .map(Seat::id)
            .collect();
        DriverStatus::AwaitingInput { seats }
    }
}
