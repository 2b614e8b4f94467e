use std::collections::VecDeque;

use tracing::{debug, info};

use crate::engine::action_mask::{ActionMask, PendingActions};
use crate::error::{EngineError, EngineResult};
use crate::game::action::{ClaimChoice, Choice, TakenAction, TurnChoice};
use crate::game::behavior::{BehaviorKind, Decision, Prompt, SeatBehavior, SeatView};
use crate::game::claim::ClaimHandler;
use crate::game::constants::{EventId, SeatId};
use crate::game::kong::KongHandler;
use crate::game::meld::GangKind;
use crate::game::player::{SeatPhase, SeatState};
use crate::game::ready::ReadyChecker;
use crate::game::rules::{RoundRules, RulesetConfig};
use crate::game::tile_info::TileInfo;
use crate::tile::{Suit, Tile};
use crate::utils::TileKindSet;

/// 发往座位队列的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatCommand {
    /// 新一局：规则快照和起手牌
    StartRound { rules: RoundRules, tiles: Vec<Tile> },
    /// 请求定缺；`event` 为本局第一个牌事件编号，定缺上报带回它
    PromptVoidSuit { event: EventId },
    /// 摸牌（`replacement_hint` 为下一张杠后补牌，用于杠上开花提示）
    NewTile {
        info: TileInfo,
        replacement_hint: Option<Tile>,
    },
    /// 别人打出一张牌
    ClaimWindow { info: TileInfo },
    /// 别人正在加杠（或暗杠）
    RobKongWindow { info: TileInfo, concealed: bool },
    /// 仲裁结果；`actions` 为空表示本事件没有获准的动作
    Grant { event: EventId, actions: PendingActions },
    /// 本座位宣布的杠的结果
    CompleteKong { event: EventId, robbed: bool },
    /// 界面或远端给出的决定
    Submit { choice: Choice },
    EndRound,
}

impl SeatCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SeatCommand::StartRound { .. } => "start_round",
            SeatCommand::PromptVoidSuit { .. } => "prompt_void_suit",
            SeatCommand::NewTile { .. } => "new_tile",
            SeatCommand::ClaimWindow { .. } => "claim_window",
            SeatCommand::RobKongWindow { .. } => "rob_kong_window",
            SeatCommand::Grant { .. } => "grant",
            SeatCommand::CompleteKong { .. } => "complete_kong",
            SeatCommand::Submit { .. } => "submit",
            SeatCommand::EndRound => "end_round",
        }
    }

    /// 需要先定缺才能处理的命令
    fn gated_by_void_suit(&self) -> bool {
        matches!(
            self,
            SeatCommand::NewTile { .. } | SeatCommand::ClaimWindow { .. } | SeatCommand::RobKongWindow { .. }
        )
    }
}

/// 座位上报给牌局协调器的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatReport {
    /// 定缺完成；`event` 为请求定缺时的事件编号
    VoidSuitDeclared { seat: SeatId, event: EventId, suit: Suit },
    /// 对别人的牌计算完候选动作
    Collected {
        seat: SeatId,
        event: EventId,
        pending: PendingActions,
    },
    /// 自己回合的动作（自摸、杠、出牌）
    TurnAction {
        seat: SeatId,
        event: EventId,
        action: TakenAction,
    },
    /// 对获准动作的选择
    ClaimAction {
        seat: SeatId,
        event: EventId,
        action: TakenAction,
    },
}

impl SeatReport {
    pub fn seat(&self) -> SeatId {
        match self {
            SeatReport::VoidSuitDeclared { seat, .. }
            | SeatReport::Collected { seat, .. }
            | SeatReport::TurnAction { seat, .. }
            | SeatReport::ClaimAction { seat, .. } => *seat,
        }
    }

    pub fn event(&self) -> Option<EventId> {
        match self {
            SeatReport::VoidSuitDeclared { event, .. }
            | SeatReport::Collected { event, .. }
            | SeatReport::TurnAction { event, .. }
            | SeatReport::ClaimAction { event, .. } => Some(*event),
        }
    }
}

/// 座位
///
/// 持有一家的状态机，只通过自己的命令队列修改手牌。三种控制方式
/// （本地玩家、脚本、远端代理）都由 `behavior` 提供决定，状态机本身相同
pub struct Seat {
    id: SeatId,
    state: SeatState,
    rules: RoundRules,
    behavior: Box<dyn SeatBehavior>,
    /// 定缺之前收到的牌事件
    deferred: VecDeque<SeatCommand>,
    /// 正在等待的决定
    awaiting: Option<Prompt>,
    /// 已宣布、尚未完成的杠
    kong: Option<(Tile, GangKind)>,
    /// 本局定缺请求的事件编号
    void_event: EventId,
}

impl Seat {
    pub fn new(id: SeatId, behavior: Box<dyn SeatBehavior>) -> Self {
        Self {
            id,
            state: SeatState::new(id),
            rules: RoundRules::new(RulesetConfig::default()),
            behavior,
            deferred: VecDeque::new(),
            awaiting: None,
            kong: None,
            void_event: 0,
        }
    }

    pub fn id(&self) -> SeatId {
        self.id
    }

    pub fn state(&self) -> &SeatState {
        &self.state
    }

    pub fn rules(&self) -> &RoundRules {
        &self.rules
    }

    pub fn behavior_kind(&self) -> BehaviorKind {
        self.behavior.kind()
    }

    pub fn awaiting(&self) -> Option<&Prompt> {
        self.awaiting.as_ref()
    }

    /// 规则要求定缺但还没有定
    pub fn is_void_pending(&self) -> bool {
        self.rules.config.requires_void_suit && self.state.void_suit.is_none()
    }

    /// 是否有等待定缺的牌事件
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// 处理一条命令
    ///
    /// # 参数
    ///
    /// - `target`: 命令的目标座位，必须是本座位
    /// - `command`: 命令
    ///
    /// # 返回
    ///
    /// 本次处理产生的上报（按产生顺序）
    pub fn handle(&mut self, target: SeatId, command: SeatCommand) -> EngineResult<Vec<SeatReport>> {
        if target != self.id {
            return Err(EngineError::WrongQueue {
                target,
                queue: self.id,
                command: command.name(),
            });
        }
        let mut reports = Vec::new();
        self.dispatch(command, &mut reports)?;
        Ok(reports)
    }

    /// 提交等待中的决定
    pub fn submit(&mut self, choice: Choice) -> EngineResult<Vec<SeatReport>> {
        let mut reports = Vec::new();
        self.apply_choice(choice, &mut reports)?;
        Ok(reports)
    }

    /// 自动定缺（选牌最少的一门）
    pub fn auto_declare_void_suit(&mut self) -> EngineResult<Vec<SeatReport>> {
        if !self.is_void_pending() {
            return Ok(Vec::new());
        }
        let suit = crate::game::void_suit::VoidSuitRules::auto_choice(&self.state.hand);
        info!(seat = self.id, suit = ?suit, "void suit auto-declared");
        self.awaiting = Some(Prompt::VoidSuit);
        self.submit(Choice::VoidSuit { suit })
    }

    fn dispatch(&mut self, command: SeatCommand, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        if command.gated_by_void_suit() && self.is_void_pending() {
            debug!(seat = self.id, command = command.name(), "deferred until void suit declared");
            self.deferred.push_back(command);
            return Ok(());
        }

        match command {
            SeatCommand::StartRound { rules, tiles } => {
                self.rules = rules;
                self.state.reset();
                self.state.deal(&tiles)?;
                self.deferred.clear();
                self.awaiting = None;
                self.kong = None;
                self.void_event = 0;
                debug!(seat = self.id, tiles = tiles.len(), "hand dealt");
                self.refresh();
                Ok(())
            }
            SeatCommand::PromptVoidSuit { event } => {
                self.void_event = event;
                if self.state.void_suit.is_some() {
                    return Ok(());
                }
                self.prompt(Prompt::VoidSuit, reports)
            }
            SeatCommand::NewTile { info, replacement_hint } => self.on_new_tile(info, replacement_hint, reports),
            SeatCommand::ClaimWindow { info } => {
                self.on_window(info, reports, |state, rules, info| ActionMask::for_discard(state, rules, info))
            }
            SeatCommand::RobKongWindow { info, concealed } => self.on_window(info, reports, |state, rules, info| {
                ActionMask::for_rob_kong(state, rules, info, concealed)
            }),
            SeatCommand::Grant { event, actions } => self.on_grant(event, actions, reports),
            SeatCommand::CompleteKong { event, robbed } => self.on_complete_kong(event, robbed),
            SeatCommand::Submit { choice } => self.apply_choice(choice, reports),
            SeatCommand::EndRound => {
                self.deferred.clear();
                self.awaiting = None;
                self.kong = None;
                debug!(seat = self.id, "round ended");
                Ok(())
            }
        }
    }

    /// 向行为策略请求决定，立即给出的决定直接执行
    fn prompt(&mut self, prompt: Prompt, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        let view = SeatView {
            state: &self.state,
            rules: &self.rules,
        };
        let decision = self.behavior.decide(&view, &prompt)?;
        self.awaiting = Some(prompt);
        match decision {
            Decision::Now(choice) => self.apply_choice(choice, reports),
            Decision::Deferred => Ok(()),
        }
    }

    fn refresh(&mut self) {
        let view = SeatView {
            state: &self.state,
            rules: &self.rules,
        };
        self.behavior.view_changed(&view);
    }

    fn not_pending(&self, choice: &Choice) -> EngineError {
        EngineError::ActionNotPending {
            seat: self.id,
            event: self.state.event(),
            action: format!("{choice:?}"),
        }
    }

    /// 检查决定与等待中的提示是否匹配（不修改状态）
    fn validate(&self, prompt: &Prompt, choice: &Choice) -> EngineResult<()> {
        let valid = match (prompt, choice) {
            (Prompt::VoidSuit, Choice::VoidSuit { suit }) => suit.is_suited(),
            (Prompt::Actions { pending, .. }, Choice::Turn { turn }) => match turn {
                TurnChoice::Hu => pending.hu,
                TurnChoice::Gang { tile } => pending.gang_for(*tile).is_some(),
                TurnChoice::Ting { discard } => pending.ting.contains(*discard),
                TurnChoice::Pass => true,
            },
            (Prompt::Throw { event, allowed }, Choice::Throw { tile }) => {
                if !allowed.contains(*tile) {
                    return Err(EngineError::IllegalThrow {
                        seat: self.id,
                        event: *event,
                        tile: *tile,
                        reason: if !self.state.hand.has_tile(*tile) {
                            "tile is not in hand"
                        } else if self.state.ready {
                            "ready hand must keep its waits"
                        } else {
                            "void suit tiles must be thrown first"
                        },
                    });
                }
                true
            }
            (Prompt::Claim { granted, .. }, Choice::Claim { claim }) => match claim {
                ClaimChoice::Hu => granted.hu,
                ClaimChoice::Gang => !granted.gangs.is_empty(),
                ClaimChoice::Peng => granted.peng,
                ClaimChoice::Chi { position } => granted.chi_at(*position).is_some(),
                ClaimChoice::Pass => true,
            },
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(self.not_pending(choice))
        }
    }

    fn apply_choice(&mut self, choice: Choice, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        let prompt = match self.awaiting.as_ref() {
            Some(prompt) => {
                self.validate(prompt, &choice)?;
                self.awaiting.take()
            }
            None => None,
        };

        match (prompt, choice) {
            (Some(Prompt::VoidSuit), Choice::VoidSuit { suit }) => self.on_void_declared(suit, reports),
            (Some(Prompt::Actions { info, .. }), Choice::Turn { turn }) => self.on_turn_choice(info, turn, reports),
            (Some(Prompt::Throw { event, .. }), Choice::Throw { tile }) => {
                self.throw_tile(event, tile, None, reports)
            }
            (Some(Prompt::Claim { info, granted }), Choice::Claim { claim }) => {
                self.on_claim_choice(info, granted, claim, reports)
            }
            _ => Err(self.not_pending(&choice)),
        }?;

        self.drain_deferred(reports)
    }

    /// 定缺后按顺序处理之前推迟的牌事件
    fn drain_deferred(&mut self, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        while self.awaiting.is_none() && !self.is_void_pending() {
            let Some(command) = self.deferred.pop_front() else {
                break;
            };
            debug!(seat = self.id, command = command.name(), "resuming deferred command");
            self.dispatch(command, reports)?;
        }
        Ok(())
    }

    fn on_void_declared(&mut self, suit: Suit, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        self.state.declare_void(suit);
        info!(seat = self.id, suit = ?suit, "void suit declared");
        reports.push(SeatReport::VoidSuitDeclared {
            seat: self.id,
            event: self.void_event,
            suit,
        });
        Ok(())
    }

    fn on_new_tile(
        &mut self,
        info: TileInfo,
        replacement_hint: Option<Tile>,
        reports: &mut Vec<SeatReport>,
    ) -> EngineResult<()> {
        self.state.ensure_mutable(self.rules.config.allow_repeat_win)?;
        self.state.begin_event(info.clone(), SeatPhase::EvaluatingNewTile);
        self.state.receive(info.tile)?;

        let pending = ActionMask::for_new_tile(&self.state, &self.rules, replacement_hint);
        if let Some(record) = self.state.record.as_mut() {
            record.collect(pending.clone());
        }
        debug!(
            seat = self.id,
            event = info.event,
            tile = %info.tile,
            actions = ?pending.kinds(),
            ting = pending.ting.len(),
            "new tile evaluated"
        );
        self.refresh();

        if pending.is_empty() {
            self.offer_throw(info.event, reports)
        } else {
            self.state.phase = SeatPhase::AwaitingActionChoice;
            self.prompt(Prompt::Actions { info, pending }, reports)
        }
    }

    fn offer_throw(&mut self, event: EventId, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        self.state.phase = SeatPhase::ThrowReady;
        let allowed = ActionMask::allowed_throws(&self.state, &self.rules);
        self.prompt(Prompt::Throw { event, allowed }, reports)
    }

    fn on_turn_choice(&mut self, info: TileInfo, turn: TurnChoice, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        let event = info.event;
        match turn {
            TurnChoice::Hu => {
                let pattern = self
                    .rules
                    .evaluator(self.state.void_suit)
                    .check(&self.state.hand, self.state.meld_count())
                    .win_type;
                let action = TakenAction::Hu {
                    tile: info.tile,
                    self_drawn: true,
                    pattern,
                };
                self.state.take(action.clone());
                self.state
                    .record_win(info.tile, true, self.rules.config.allow_repeat_win)?;
                info!(seat = self.id, event, tile = %info.tile, pattern = ?pattern, "self-drawn win");
                reports.push(SeatReport::TurnAction {
                    seat: self.id,
                    event,
                    action,
                });
                self.refresh();
                Ok(())
            }
            TurnChoice::Gang { tile } => {
                let kind = self
                    .state
                    .record
                    .as_ref()
                    .and_then(|record| record.pending.gang_for(tile))
                    .map(|candidate| candidate.kind)
                    .ok_or_else(|| self.not_pending(&Choice::Turn { turn }))?;
                let action = TakenAction::Gang { tile, kind };
                self.state.take(action.clone());
                self.state.phase = SeatPhase::AwaitingKong;
                self.kong = Some((tile, kind));
                debug!(seat = self.id, event, tile = %tile, kind = ?kind, "kong declared");
                reports.push(SeatReport::TurnAction {
                    seat: self.id,
                    event,
                    action,
                });
                Ok(())
            }
            TurnChoice::Ting { discard } => {
                let evaluator = self.rules.evaluator(self.state.void_suit);
                let waits = ReadyChecker::waits_after_discard(&self.state, discard, &evaluator);
                self.state.declare_ready(waits);
                info!(seat = self.id, event, discard = %discard, waits = waits.len(), "ready declared");
                self.throw_tile(event, discard, Some(waits), reports)
            }
            TurnChoice::Pass => self.offer_throw(event, reports),
        }
    }

    fn throw_tile(
        &mut self,
        event: EventId,
        tile: Tile,
        waits: Option<TileKindSet>,
        reports: &mut Vec<SeatReport>,
    ) -> EngineResult<()> {
        self.state.ensure_mutable(self.rules.config.allow_repeat_win)?;
        self.state.throw(tile)?;
        let action = TakenAction::Throw { tile, waits };
        self.state.take(action.clone());
        debug!(seat = self.id, event, tile = %tile, "tile thrown");
        reports.push(SeatReport::TurnAction {
            seat: self.id,
            event,
            action,
        });
        self.refresh();
        Ok(())
    }

    /// 对别人的牌（出牌或杠牌）计算候选动作并上报
    fn on_window<F>(&mut self, info: TileInfo, reports: &mut Vec<SeatReport>, evaluate: F) -> EngineResult<()>
    where
        F: FnOnce(&SeatState, &RoundRules, &TileInfo) -> PendingActions,
    {
        self.state.begin_event(info.clone(), SeatPhase::EvaluatingClaim);
        let pending = evaluate(&self.state, &self.rules, &info);
        if let Some(record) = self.state.record.as_mut() {
            record.collect(pending.clone());
        }
        self.state.phase = if pending.is_empty() {
            SeatPhase::AwaitingTile
        } else {
            SeatPhase::AwaitingGrant
        };
        debug!(
            seat = self.id,
            event = info.event,
            tile = %info.tile,
            actions = ?pending.kinds(),
            "claim candidates collected"
        );
        reports.push(SeatReport::Collected {
            seat: self.id,
            event: info.event,
            pending,
        });
        Ok(())
    }

    fn on_grant(&mut self, event: EventId, actions: PendingActions, reports: &mut Vec<SeatReport>) -> EngineResult<()> {
        let record = self
            .state
            .record
            .as_ref()
            .filter(|record| record.event() == event && record.collected)
            .ok_or_else(|| EngineError::ActionNotPending {
                seat: self.id,
                event,
                action: format!("grant {:?}", actions.kinds()),
            })?;

        if actions.is_empty() {
            self.state.take(TakenAction::Pass);
            self.state.phase = SeatPhase::AwaitingTile;
            return Ok(());
        }
        if !actions.is_subset_of(&record.pending) {
            return Err(EngineError::ActionNotPending {
                seat: self.id,
                event,
                action: format!("grant {:?}", actions.kinds()),
            });
        }

        let info = record.info.clone();
        self.state.phase = SeatPhase::AwaitingClaimChoice;
        self.prompt(Prompt::Claim { info, granted: actions }, reports)
    }

    fn on_claim_choice(
        &mut self,
        info: TileInfo,
        granted: PendingActions,
        claim: ClaimChoice,
        reports: &mut Vec<SeatReport>,
    ) -> EngineResult<()> {
        let tile = info.tile;
        let from = info.origin_seat;
        let action = match claim {
            ClaimChoice::Hu => {
                let pattern = self
                    .rules
                    .evaluator(self.state.void_suit)
                    .check_with(&self.state.hand, tile, self.state.meld_count())
                    .win_type;
                self.state.record_win(tile, false, self.rules.config.allow_repeat_win)?;
                info!(seat = self.id, event = info.event, tile = %tile, from, "won on claimed tile");
                TakenAction::Hu {
                    tile,
                    self_drawn: false,
                    pattern,
                }
            }
            ClaimChoice::Gang => {
                KongHandler::apply(&mut self.state, tile, GangKind::PromotedTriplet, Some(from))?;
                self.state.phase = SeatPhase::AwaitingTile;
                TakenAction::Gang {
                    tile,
                    kind: GangKind::PromotedTriplet,
                }
            }
            ClaimChoice::Peng => {
                ClaimHandler::apply_peng(&mut self.state, tile, from)?;
                TakenAction::Peng { tile }
            }
            ClaimChoice::Chi { position } => {
                let option = granted
                    .chi_at(position)
                    .ok_or_else(|| self.not_pending(&Choice::Claim { claim }))?;
                ClaimHandler::apply_chi(&mut self.state, option, from)?;
                TakenAction::Chi {
                    tiles: option.tiles,
                    position,
                }
            }
            ClaimChoice::Pass => {
                self.state.phase = SeatPhase::AwaitingTile;
                TakenAction::Pass
            }
        };

        debug!(seat = self.id, event = info.event, action = action.name(), "claim resolved");
        self.state.take(action.clone());
        reports.push(SeatReport::ClaimAction {
            seat: self.id,
            event: info.event,
            action,
        });
        self.refresh();

        if matches!(claim, ClaimChoice::Peng | ClaimChoice::Chi { .. }) {
            self.offer_throw(info.event, reports)?;
        }
        Ok(())
    }

    fn on_complete_kong(&mut self, event: EventId, robbed: bool) -> EngineResult<()> {
        let (tile, kind) = self.kong.take().ok_or_else(|| EngineError::InvalidPhase {
            seat: Some(self.id),
            expected: "a declared kong",
            actual: format!("{:?} at event {event}", self.state.phase),
        })?;
        if robbed {
            self.state.remove_concealed(tile, 1, "robbed kong")?;
            info!(seat = self.id, event, tile = %tile, "kong robbed");
        } else {
            KongHandler::apply(&mut self.state, tile, kind, None)?;
            debug!(seat = self.id, event, tile = %tile, kind = ?kind, "kong completed");
        }
        self.state.phase = SeatPhase::AwaitingTile;
        self.refresh();
        Ok(())
    }
}
