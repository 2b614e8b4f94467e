use smallvec::SmallVec;
use tracing::{debug, info};

use crate::engine::action_mask::PendingActions;
use crate::error::{EngineError, EngineResult};
use crate::game::action::TakenAction;
use crate::game::arbiter::{ActionArbiter, Resolution};
use crate::game::banker::BankerState;
use crate::game::constants::{distance_from, others_in_turn_order, EventId, SeatId, HAND_SIZE, NUM_SEATS};
use crate::game::meld::GangKind;
use crate::game::rules::{Ruleset, RulesetConfig};
use crate::game::seat::{SeatCommand, SeatReport};
use crate::game::state::{
    ActionNotice, DiscardRecord, DrawReason, KongRecord, RoundOutcome, RoundPhase, RoundState, RoundSummary,
    WinRecord, WinSource,
};
use crate::game::tile_info::{TileInfo, TileOrigin};
use crate::game::void_suit::VoidSuitRules;
use crate::sync::message::SyncMessage;
use crate::tile::{Suit, Tile, Wall, WinType};

/// 协调器发出的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// 投递到座位队列
    Seat { to: SeatId, command: SeatCommand },
    /// 发给同步网关
    Sync(SyncMessage),
    /// 发给副作用队列
    Notice(ActionNotice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowKind {
    Discard,
    RobKong { concealed: bool },
}

/// 已宣布、等待抢杠结果的杠
#[derive(Debug, Clone, Copy)]
struct DeclaredKong {
    seat: SeatId,
    tile: Tile,
    kind: GangKind,
    event: EventId,
}

/// 协调器正在等待的上报
#[derive(Debug, Clone)]
enum Waiting {
    Idle,
    /// 等待某个座位的回合动作
    Turn { seat: SeatId, event: EventId },
    /// 等待其他座位对一张牌计算候选动作（屏障：全部上报后才仲裁）
    Window {
        origin: SeatId,
        info: TileInfo,
        kind: WindowKind,
        waiting: SmallVec<[SeatId; 3]>,
        collected: SmallVec<[(SeatId, PendingActions); 3]>,
    },
    /// 等待获准的座位做出选择
    Grants {
        origin: SeatId,
        info: TileInfo,
        kind: WindowKind,
        waiting: SmallVec<[SeatId; 3]>,
        decisions: SmallVec<[(SeatId, TakenAction); 3]>,
    },
}

impl Waiting {
    fn name(&self) -> &'static str {
        match self {
            Waiting::Idle => "nothing",
            Waiting::Turn { .. } => "a turn action",
            Waiting::Window { .. } => "claim candidates",
            Waiting::Grants { .. } => "claim decisions",
        }
    }
}

/// 牌局协调器
///
/// 持有牌墙、庄家和牌局状态，驱动发牌、摸牌、广播出牌、仲裁和结算。
/// 不直接调用座位：所有输出都是 `Dispatch`，由驱动器投递到对应队列
pub struct RoundCoordinator {
    ruleset: Ruleset,
    banker: BankerState,
    wall: Wall,
    round: RoundState,
    round_number: u32,
    waiting: Waiting,
    /// 当前回合摸到的牌
    current_draw: Option<TileInfo>,
    declared_kong: Option<DeclaredKong>,
    /// 杠数已超过上限：这次补牌后不胡就流局
    kong_last_chance: bool,
}

impl RoundCoordinator {
    pub fn new(config: RulesetConfig, banker: SeatId) -> Self {
        Self {
            ruleset: Ruleset::new(config),
            banker: BankerState::new(banker % NUM_SEATS),
            wall: Wall::from_tiles(Vec::new()),
            round: RoundState::new(),
            round_number: 0,
            waiting: Waiting::Idle,
            current_draw: None,
            declared_kong: None,
            kong_last_chance: false,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn banker(&self) -> &BankerState {
        &self.banker
    }

    pub fn round_state(&self) -> &RoundState {
        &self.round
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.round.outcome.as_ref()
    }

    /// 当前等待上报的座位
    pub fn waiting_on(&self) -> SmallVec<[SeatId; 3]> {
        match &self.waiting {
            Waiting::Idle => SmallVec::new(),
            Waiting::Turn { seat, .. } => SmallVec::from_iter([*seat]),
            Waiting::Window { waiting, .. } | Waiting::Grants { waiting, .. } => waiting.clone(),
        }
    }

    /// 按本玩法的牌池生成洗好的牌墙
    pub fn fresh_wall(&self, seed: Option<u64>) -> Wall {
        let mut wall = Wall::new(self.ruleset.config().tile_pool());
        match seed {
            Some(seed) => wall.shuffle_seeded(seed),
            None => wall.shuffle(),
        }
        wall
    }

    /// 开始新的一局
    ///
    /// 依次：重置玩法计数器、翻亮牌（推导财神）、从庄家开始每家连续发 13 张、
    /// 需要时请求定缺、庄家摸第一张牌
    ///
    /// # 参数
    ///
    /// - `wall`: 洗好的牌墙（非权威节点传入镜像的牌序）
    pub fn start_round(&mut self, mut wall: Wall) -> EngineResult<Vec<Dispatch>> {
        if self.round.phase != RoundPhase::NotStarted {
            return Err(EngineError::InvalidPhase {
                seat: None,
                expected: "NotStarted",
                actual: format!("{:?}", self.round.phase),
            });
        }

        self.round_number += 1;
        self.ruleset.restart();
        self.round.begin(self.round_number, self.banker.seat);
        self.waiting = Waiting::Idle;
        self.current_draw = None;
        self.declared_kong = None;
        self.kong_last_chance = false;

        if self.ruleset.config().reveal_shown_tile {
            if let Some(tile) = wall.reveal_shown_tile() {
                self.ruleset.set_shown_tile(tile);
                info!(tile = %tile, wildcard = ?self.ruleset.wildcard(), "shown tile revealed");
            }
        }

        let banker = self.banker.seat;
        let mut out = vec![
            Dispatch::Sync(SyncMessage::BankerInfo {
                banker,
                streak: self.banker.streak,
            }),
            Dispatch::Sync(SyncMessage::StartRound {
                round: self.round_number,
                banker,
                wall: wall.live_tiles().to_vec(),
            }),
            Dispatch::Sync(SyncMessage::ShownTile {
                tile: wall.shown_tile(),
            }),
        ];

        let rules = self.ruleset.round_rules();
        for offset in 0..NUM_SEATS {
            let seat = (banker + offset) % NUM_SEATS;
            let mut tiles = Vec::with_capacity(HAND_SIZE);
            for _ in 0..HAND_SIZE {
                let tile = wall.draw().ok_or_else(|| EngineError::InvalidPhase {
                    seat: Some(seat),
                    expected: "enough tiles to deal",
                    actual: format!("wall of {} tiles", wall.total_count()),
                })?;
                tiles.push(tile);
            }
            out.push(Dispatch::Seat {
                to: seat,
                command: SeatCommand::StartRound {
                    rules: rules.clone(),
                    tiles,
                },
            });
        }
        self.wall = wall;
        info!(
            round = self.round_number,
            banker,
            ruleset = %self.ruleset.config().kind,
            live = self.wall.remaining_count(),
            "round dealt"
        );

        if self.ruleset.config().requires_void_suit {
            self.round.phase = RoundPhase::DeterminingVoidSuits;
            for seat in 0..NUM_SEATS {
                out.push(Dispatch::Seat {
                    to: seat,
                    command: SeatCommand::PromptVoidSuit {
                        event: self.round.first_event,
                    },
                });
            }
        } else {
            self.round.phase = RoundPhase::Playing;
        }

        self.draw_for(banker, None, &mut out);
        Ok(out)
    }

    /// 处理座位上报
    pub fn handle_report(&mut self, report: SeatReport) -> EngineResult<Vec<Dispatch>> {
        let mut out = Vec::new();
        let in_play = matches!(
            self.round.phase,
            RoundPhase::DeterminingVoidSuits | RoundPhase::Playing
        );
        if !in_play || self.round.is_over() {
            debug!(seat = report.seat(), phase = ?self.round.phase, "report outside play ignored");
            return Ok(out);
        }
        if report.event().is_some_and(|event| event < self.round.first_event) {
            debug!(seat = report.seat(), event = ?report.event(), "stale report from an earlier round ignored");
            return Ok(out);
        }

        match report {
            SeatReport::VoidSuitDeclared { seat, suit, .. } => self.on_void_declared(seat, suit),
            SeatReport::Collected { seat, event, pending } => self.on_collected(seat, event, pending, &mut out)?,
            SeatReport::TurnAction { seat, event, action } => self.on_turn_action(seat, event, action, &mut out)?,
            SeatReport::ClaimAction { seat, event, action } => self.on_claim_action(seat, event, action, &mut out)?,
        }
        Ok(out)
    }

    /// 有人退出：立即结束本局
    pub fn quit(&mut self, seat: SeatId) -> EngineResult<Vec<Dispatch>> {
        let mut out = Vec::new();
        if self.round.is_over() || matches!(self.round.phase, RoundPhase::NotStarted | RoundPhase::Terminated) {
            return Ok(out);
        }
        info!(seat, round = self.round_number, "player quit");
        self.end_round(RoundOutcome::PlayerQuit { seat }, &mut out);
        Ok(out)
    }

    /// 结算已结束的一局：换庄、更新圈数
    pub fn finish_round(&mut self) -> EngineResult<(RoundSummary, Vec<Dispatch>)> {
        let outcome = self.round.outcome.clone().ok_or_else(|| EngineError::InvalidPhase {
            seat: None,
            expected: "a finished round",
            actual: format!("{:?}", self.round.phase),
        })?;

        let policy = self.ruleset.config().banker_policy;
        let repeat_on_draw = self.ruleset.config().repeat_banker_on_draw;
        let change = self.banker.succeed(policy, repeat_on_draw, &outcome);

        let mut out = vec![Dispatch::Sync(SyncMessage::BankerInfo {
            banker: change.current,
            streak: change.streak,
        })];
        if change.wrapped {
            let circle = self.ruleset.increment_circle();
            info!(circle, "circle completed");
            out.push(Dispatch::Sync(SyncMessage::CircleIncrement { circle }));
        }

        self.round.phase = RoundPhase::NotStarted;
        let summary = RoundSummary {
            round: self.round_number,
            outcome,
            record: self.round.record.clone(),
            banker: self.banker,
            circle: self.ruleset.counters().circle_count,
        };
        Ok((summary, out))
    }

    /// 结束整场
    pub fn terminate(&mut self) {
        self.round.phase = RoundPhase::Terminated;
        self.waiting = Waiting::Idle;
        info!(rounds = self.round_number, "session terminated");
    }

    fn unexpected(&self, seat: SeatId, event: Option<EventId>, detail: String) -> EngineError {
        EngineError::UnexpectedReport { seat, event, detail }
    }

    fn on_void_declared(&mut self, seat: SeatId, suit: Suit) {
        if let Some(slot) = self.round.void_suits.get_mut(seat as usize) {
            *slot = Some(suit);
        }
        if self.round.phase == RoundPhase::DeterminingVoidSuits
            && VoidSuitRules::all_declared(&self.round.void_suits, |s| self.round.is_active(s))
        {
            self.round.phase = RoundPhase::Playing;
            info!(suits = ?self.round.void_suits, "all void suits declared");
        }
    }

    /// 摸牌（`kong` 为杠牌时从牌墙后端补牌）
    fn draw_for(&mut self, seat: SeatId, kong: Option<Tile>, out: &mut Vec<Dispatch>) {
        if self.wall.is_exhausted(self.ruleset.counters().least_remaining) {
            self.end_exhausted(out);
            return;
        }
        let had_shown = self.wall.shown_tile().is_some();
        let drawn = match kong {
            Some(_) => self.wall.draw_back(),
            None => self.wall.draw(),
        };
        let Some(tile) = drawn else {
            self.end_exhausted(out);
            return;
        };
        if had_shown && self.wall.shown_tile().is_none() {
            self.ruleset.clear_shown_tile();
            out.push(Dispatch::Sync(SyncMessage::ShownTile { tile: None }));
        }

        let event = self.round.allocate_event();
        let info = match kong {
            Some(kong_tile) => TileInfo::replacement(event, tile, seat, kong_tile),
            None => TileInfo::new(event, tile, seat, TileOrigin::New),
        };
        let replacement_hint = self.wall.shown_tile();
        debug!(
            seat,
            event,
            tile = %tile,
            replacement = kong.is_some(),
            live = self.wall.remaining_count(),
            "tile drawn"
        );

        self.current_draw = Some(info.clone());
        self.waiting = Waiting::Turn { seat, event };
        out.push(Dispatch::Sync(SyncMessage::LiveTileCount {
            count: self.wall.remaining_count(),
        }));
        out.push(Dispatch::Sync(SyncMessage::WaitingSeat { seat }));
        out.push(Dispatch::Seat {
            to: seat,
            command: SeatCommand::NewTile { info, replacement_hint },
        });
    }

    fn on_turn_action(
        &mut self,
        seat: SeatId,
        event: EventId,
        action: TakenAction,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        let expected = matches!(self.waiting, Waiting::Turn { seat: s, event: e } if s == seat && e == event);
        if !expected {
            return Err(self.unexpected(
                seat,
                Some(event),
                format!("turn action `{}` while waiting for {}", action.name(), self.waiting.name()),
            ));
        }
        out.push(Dispatch::Notice(ActionNotice::from_action(seat, &action)));

        match action {
            TakenAction::Hu {
                tile,
                self_drawn: true,
                pattern,
            } => {
                let source = match &self.current_draw {
                    Some(info) if info.event == event && info.is_kong_replacement() => WinSource::KongFlower,
                    _ => WinSource::SelfDraw,
                };
                self.record_win(seat, tile, source, pattern, event);
                self.after_wins(seat, &[seat], out);
            }
            TakenAction::Gang { tile, kind } => self.on_kong_declared(seat, event, tile, kind, out)?,
            TakenAction::Throw { tile, waits } => {
                if self.kong_last_chance {
                    info!(seat, event, "no win after the last permitted kong");
                    self.end_round(
                        RoundOutcome::Drawn {
                            reason: DrawReason::KongLimit,
                        },
                        out,
                    );
                    return Ok(());
                }
                if let Some(waits) = waits {
                    info!(seat, event, waits = waits.len(), "seat is ready");
                }
                self.round.record.discards.push(DiscardRecord { seat, tile, event });
                let discard_event = self.round.allocate_event();
                let info = TileInfo::new(discard_event, tile, seat, TileOrigin::Thrown);
                self.open_window(seat, info, WindowKind::Discard, out)?;
            }
            other => {
                return Err(self.unexpected(
                    seat,
                    Some(event),
                    format!("`{}` is not a turn action", other.name()),
                ))
            }
        }
        Ok(())
    }

    fn on_kong_declared(
        &mut self,
        seat: SeatId,
        event: EventId,
        tile: Tile,
        kind: GangKind,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        if self.kong_last_chance {
            info!(seat, event, "kong declared after the last permitted kong");
            self.end_round(
                RoundOutcome::Drawn {
                    reason: DrawReason::KongLimit,
                },
                out,
            );
            return Ok(());
        }

        self.declared_kong = Some(DeclaredKong { seat, tile, kind, event });
        let robbable = match kind {
            GangKind::PromotedPeng => true,
            GangKind::Concealed => self.ruleset.config().allow_rob_concealed_kong,
            GangKind::PromotedTriplet => false,
        };
        if robbable {
            let rob_event = self.round.allocate_event();
            let info = TileInfo::new(rob_event, tile, seat, TileOrigin::Claimed);
            let concealed = kind == GangKind::Concealed;
            self.open_window(seat, info, WindowKind::RobKong { concealed }, out)
        } else {
            self.complete_declared_kong(false, out)
        }
    }

    fn complete_declared_kong(&mut self, robbed: bool, out: &mut Vec<Dispatch>) -> EngineResult<()> {
        let kong = self.declared_kong.take().ok_or_else(|| EngineError::InvalidPhase {
            seat: None,
            expected: "a declared kong",
            actual: self.waiting.name().to_string(),
        })?;
        out.push(Dispatch::Seat {
            to: kong.seat,
            command: SeatCommand::CompleteKong {
                event: kong.event,
                robbed,
            },
        });
        self.round.record.kongs.push(KongRecord {
            seat: kong.seat,
            tile: kong.tile,
            kind: kong.kind,
            event: kong.event,
            robbed,
        });
        if !robbed {
            self.replace_after_kong(kong.seat, kong.tile, out);
        }
        Ok(())
    }

    fn replace_after_kong(&mut self, seat: SeatId, tile: Tile, out: &mut Vec<Dispatch>) {
        if self.ruleset.record_kong() {
            self.kong_last_chance = true;
            info!(
                seat,
                kongs = self.ruleset.counters().kong_count,
                "kong limit exceeded, replacement draw is the last chance"
            );
        }
        self.draw_for(seat, Some(tile), out);
    }

    /// 向其他仍在局中的座位广播一张牌
    fn open_window(
        &mut self,
        origin: SeatId,
        info: TileInfo,
        kind: WindowKind,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        let seats: SmallVec<[SeatId; 3]> = others_in_turn_order(origin)
            .into_iter()
            .filter(|&seat| self.round.is_active(seat))
            .collect();
        for &seat in &seats {
            let command = match kind {
                WindowKind::Discard => SeatCommand::ClaimWindow { info: info.clone() },
                WindowKind::RobKong { concealed } => SeatCommand::RobKongWindow {
                    info: info.clone(),
                    concealed,
                },
            };
            out.push(Dispatch::Seat { to: seat, command });
        }
        debug!(origin, event = info.event, tile = %info.tile, ?seats, "claim window opened");

        if seats.is_empty() {
            self.waiting = Waiting::Idle;
            return self.resolve_window(origin, info, kind, SmallVec::new(), out);
        }
        self.waiting = Waiting::Window {
            origin,
            info,
            kind,
            waiting: seats,
            collected: SmallVec::new(),
        };
        Ok(())
    }

    fn on_collected(
        &mut self,
        seat: SeatId,
        event: EventId,
        pending: PendingActions,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        let expected = matches!(
            &self.waiting,
            Waiting::Window { info, waiting, .. } if info.event == event && waiting.contains(&seat)
        );
        if !expected {
            return Err(self.unexpected(
                seat,
                Some(event),
                format!("claim candidates while waiting for {}", self.waiting.name()),
            ));
        }

        let complete = match &mut self.waiting {
            Waiting::Window { waiting, collected, .. } => {
                waiting.retain(|s| *s != seat);
                collected.push((seat, pending));
                waiting.is_empty()
            }
            _ => false,
        };
        if !complete {
            return Ok(());
        }

        match std::mem::replace(&mut self.waiting, Waiting::Idle) {
            Waiting::Window {
                origin,
                info,
                kind,
                collected,
                ..
            } => self.resolve_window(origin, info, kind, collected, out),
            _ => Ok(()),
        }
    }

    /// 所有座位都已上报：仲裁
    fn resolve_window(
        &mut self,
        origin: SeatId,
        info: TileInfo,
        kind: WindowKind,
        mut collected: SmallVec<[(SeatId, PendingActions); 3]>,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        collected.sort_by_key(|(seat, _)| distance_from(origin, *seat));
        let resolution = match kind {
            WindowKind::Discard => ActionArbiter::resolve_discard(origin, &collected),
            WindowKind::RobKong { .. } => ActionArbiter::resolve_rob_kong(origin, &collected),
        };

        let granted = resolution.seats();
        for (seat, pending) in &collected {
            if !pending.is_empty() && !granted.contains(seat) {
                out.push(Dispatch::Seat {
                    to: *seat,
                    command: SeatCommand::Grant {
                        event: info.event,
                        actions: PendingActions::default(),
                    },
                });
            }
        }

        match resolution {
            Resolution::NoClaim => match kind {
                WindowKind::Discard => {
                    self.advance_from(origin, &[], out);
                    Ok(())
                }
                WindowKind::RobKong { .. } => self.complete_declared_kong(false, out),
            },
            Resolution::Granted(grants) => {
                for (seat, actions) in grants {
                    out.push(Dispatch::Seat {
                        to: seat,
                        command: SeatCommand::Grant {
                            event: info.event,
                            actions,
                        },
                    });
                }
                self.waiting = Waiting::Grants {
                    origin,
                    info,
                    kind,
                    waiting: granted,
                    decisions: SmallVec::new(),
                };
                Ok(())
            }
        }
    }

    fn on_claim_action(
        &mut self,
        seat: SeatId,
        event: EventId,
        action: TakenAction,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        let expected = matches!(
            &self.waiting,
            Waiting::Grants { info, waiting, .. } if info.event == event && waiting.contains(&seat)
        );
        if !expected {
            return Err(self.unexpected(
                seat,
                Some(event),
                format!("claim `{}` while waiting for {}", action.name(), self.waiting.name()),
            ));
        }

        let complete = match &mut self.waiting {
            Waiting::Grants { waiting, decisions, .. } => {
                waiting.retain(|s| *s != seat);
                decisions.push((seat, action));
                waiting.is_empty()
            }
            _ => false,
        };
        if !complete {
            return Ok(());
        }

        match std::mem::replace(&mut self.waiting, Waiting::Idle) {
            Waiting::Grants {
                origin,
                info,
                kind,
                decisions,
                ..
            } => self.apply_decisions(origin, info, kind, decisions, out),
            _ => Ok(()),
        }
    }

    /// 执行获准座位的选择
    fn apply_decisions(
        &mut self,
        origin: SeatId,
        info: TileInfo,
        kind: WindowKind,
        mut decisions: SmallVec<[(SeatId, TakenAction); 3]>,
        out: &mut Vec<Dispatch>,
    ) -> EngineResult<()> {
        decisions.sort_by_key(|(seat, _)| distance_from(origin, *seat));
        for (seat, action) in &decisions {
            if *action != TakenAction::Pass {
                out.push(Dispatch::Notice(ActionNotice::from_action(*seat, action)));
            }
        }

        let wins: SmallVec<[(SeatId, WinType); 3]> = decisions
            .iter()
            .filter_map(|(seat, action)| match action {
                TakenAction::Hu { pattern, .. } => Some((*seat, *pattern)),
                _ => None,
            })
            .collect();

        if !wins.is_empty() {
            let source = match kind {
                WindowKind::Discard => WinSource::Discard { from: origin },
                WindowKind::RobKong { .. } => WinSource::RobKong { from: origin },
            };
            for &(seat, pattern) in &wins {
                self.record_win(seat, info.tile, source, pattern, info.event);
            }
            if let WindowKind::RobKong { .. } = kind {
                self.complete_declared_kong(true, out)?;
            }
            let winners: SmallVec<[SeatId; 3]> = wins.iter().map(|(seat, _)| *seat).collect();
            self.after_wins(origin, &winners, out);
            return Ok(());
        }

        if let WindowKind::RobKong { .. } = kind {
            return self.complete_declared_kong(false, out);
        }

        match decisions.into_iter().find(|(_, action)| *action != TakenAction::Pass) {
            Some((seat, TakenAction::Gang { tile, kind: gang_kind })) => {
                info!(seat, event = info.event, tile = %tile, from = origin, "discard claimed for kong");
                self.round.record.kongs.push(KongRecord {
                    seat,
                    tile,
                    kind: gang_kind,
                    event: info.event,
                    robbed: false,
                });
                self.replace_after_kong(seat, tile, out);
                Ok(())
            }
            Some((seat, TakenAction::Peng { .. } | TakenAction::Chi { .. })) => {
                debug!(seat, event = info.event, "meld claimed, waiting for throw");
                self.current_draw = None;
                self.waiting = Waiting::Turn { seat, event: info.event };
                Ok(())
            }
            Some((seat, other)) => Err(self.unexpected(
                seat,
                Some(info.event),
                format!("`{}` is not a claim", other.name()),
            )),
            None => {
                self.advance_from(origin, &[], out);
                Ok(())
            }
        }
    }

    fn record_win(&mut self, seat: SeatId, tile: Tile, source: WinSource, pattern: WinType, event: EventId) {
        info!(seat, tile = %tile, ?source, ?pattern, event, "win recorded");
        self.round.record.wins.push(WinRecord {
            seat,
            tile,
            source,
            pattern,
            event,
        });
    }

    /// 胡牌之后：离场、判断是否继续、决定下一个摸牌的座位
    fn after_wins(&mut self, origin: SeatId, winners: &[SeatId], out: &mut Vec<Dispatch>) {
        let config = self.ruleset.config();
        let allow_repeat = config.allow_repeat_win;
        let continues = config.continue_after_win || allow_repeat;
        if !allow_repeat {
            for &winner in winners {
                self.round.mark_out(winner);
            }
        }
        self.kong_last_chance = false;

        if !continues || self.round.active_count() <= 1 {
            let wins = self.round.record.wins.clone();
            self.end_round(RoundOutcome::Normal { wins }, out);
            return;
        }
        self.advance_from(origin, winners, out);
    }

    /// 从 `origin` 出发（跳过胡牌座位）轮到下一家摸牌
    fn advance_from(&mut self, origin: SeatId, winners: &[SeatId], out: &mut Vec<Dispatch>) {
        match ActionArbiter::next_drawer(origin, winners, |seat| self.round.is_active(seat)) {
            Some(next) => self.draw_for(next, None, out),
            None => self.end_exhausted(out),
        }
    }

    fn end_exhausted(&mut self, out: &mut Vec<Dispatch>) {
        let outcome = if self.round.record.wins.is_empty() {
            RoundOutcome::Drawn {
                reason: DrawReason::WallExhausted,
            }
        } else {
            RoundOutcome::Normal {
                wins: self.round.record.wins.clone(),
            }
        };
        self.end_round(outcome, out);
    }

    fn end_round(&mut self, outcome: RoundOutcome, out: &mut Vec<Dispatch>) {
        info!(round = self.round_number, ?outcome, live = self.wall.remaining_count(), "round ended");
        self.round.outcome = Some(outcome);
        self.round.phase = RoundPhase::RoundEnding;
        self.waiting = Waiting::Idle;
        self.current_draw = None;
        self.declared_kong = None;
        self.kong_last_chance = false;
        for seat in 0..NUM_SEATS {
            out.push(Dispatch::Seat {
                to: seat,
                command: SeatCommand::EndRound,
            });
        }
    }
}
