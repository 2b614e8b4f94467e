use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::engine::action_mask::PendingActions;
use crate::error::{EngineError, EngineResult};
use crate::game::action::{ClaimChoice, Choice, TurnChoice};
use crate::game::constants::{EventId, SeatId};
use crate::game::player::SeatState;
use crate::game::rules::RoundRules;
use crate::game::tile_info::{TileInfo, TileOrigin};
use crate::game::void_suit::VoidSuitRules;
use crate::sync::message::{NodeId, SyncMessage};
use crate::tile::{Suit, Tile};
use crate::utils::TileKindSet;

/// 座位的控制方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// 本地玩家（通过表现层提示并等待选择）
    Interactive,
    /// 脚本/AI
    Scripted,
    /// 远端玩家的代理
    Proxy,
}

/// 行为策略的回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T> {
    /// 立即给出选择
    Now(T),
    /// 稍后通过 `Seat::submit` 给出
    Deferred,
}

/// 座位等待的决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum Prompt {
    /// 选择定缺花色
    VoidSuit,
    /// 摸牌后有候选动作
    Actions { info: TileInfo, pending: PendingActions },
    /// 可以出牌
    Throw { event: EventId, allowed: TileKindSet },
    /// 仲裁后获准的动作
    Claim { info: TileInfo, granted: PendingActions },
}

impl Prompt {
    pub fn event(&self) -> EventId {
        match self {
            Prompt::VoidSuit => 0,
            Prompt::Actions { info, .. } | Prompt::Claim { info, .. } => info.event,
            Prompt::Throw { event, .. } => *event,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Prompt::VoidSuit => "void_suit",
            Prompt::Actions { .. } => "actions",
            Prompt::Throw { .. } => "throw",
            Prompt::Claim { .. } => "claim",
        }
    }
}

/// 行为策略看到的座位视图
pub struct SeatView<'a> {
    pub state: &'a SeatState,
    pub rules: &'a RoundRules,
}

impl SeatView<'_> {
    pub fn seat(&self) -> SeatId {
        self.state.seat
    }
}

/// 候选动作针对的牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSource {
    /// 摸到的牌
    New,
    /// 获准吃碰杠胡的牌
    Claimed,
    /// 别人打出的牌
    Thrown,
    /// 别人加杠的牌
    Kong,
}

/// 发给表现层的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationEvent {
    ActionsAvailable {
        seat: SeatId,
        source: ActionSource,
        info: TileInfo,
        pending: PendingActions,
    },
    ThrowAvailable {
        seat: SeatId,
        event: EventId,
        allowed: TileKindSet,
    },
    ViewChanged { seat: SeatId },
    PromptVoidSuit { seat: SeatId },
    /// 同步握手未完成
    WaitingOnPeers { missing: Vec<NodeId> },
    /// 传输层提示
    Advisory { message: String },
}

/// 座位行为
///
/// 三种控制方式共用同一个座位状态机，只在需要决定时调用这里
pub trait SeatBehavior: Send {
    fn kind(&self) -> BehaviorKind;

    /// 请求一个决定
    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>>;

    /// 座位状态发生变化
    fn view_changed(&mut self, _view: &SeatView<'_>) {}
}

/// 本地玩家：把提示转成表现层事件，等待界面回调 `submit`
pub struct InteractiveBehavior {
    events: UnboundedSender<PresentationEvent>,
}

impl InteractiveBehavior {
    pub fn new(events: UnboundedSender<PresentationEvent>) -> Self {
        Self { events }
    }

    fn emit(&self, seat: SeatId, event: PresentationEvent) -> EngineResult<()> {
        self.events
            .send(event)
            .map_err(|_| EngineError::MissingCollaborator {
                seat: Some(seat),
                collaborator: "presentation layer",
            })
    }
}

impl SeatBehavior for InteractiveBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Interactive
    }

    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>> {
        let seat = view.seat();
        let event = match prompt {
            Prompt::VoidSuit => PresentationEvent::PromptVoidSuit { seat },
            Prompt::Actions { info, pending } => PresentationEvent::ActionsAvailable {
                seat,
                source: match info.origin {
                    TileOrigin::New => ActionSource::New,
                    TileOrigin::Thrown => ActionSource::Thrown,
                    TileOrigin::Claimed => ActionSource::Kong,
                },
                info: info.clone(),
                pending: pending.clone(),
            },
            Prompt::Throw { event, allowed } => PresentationEvent::ThrowAvailable {
                seat,
                event: *event,
                allowed: *allowed,
            },
            Prompt::Claim { info, granted } => PresentationEvent::ActionsAvailable {
                seat,
                source: ActionSource::Claimed,
                info: info.clone(),
                pending: granted.clone(),
            },
        };
        self.emit(seat, event)?;
        Ok(Decision::Deferred)
    }

    fn view_changed(&mut self, view: &SeatView<'_>) {
        let seat = view.seat();
        if self.emit(seat, PresentationEvent::ViewChanged { seat }).is_err() {
            debug!(seat, "presentation layer gone, view change dropped");
        }
    }
}

/// 远端玩家代理：把提示转发给对端，决定由同步网关回传
pub struct ProxyBehavior {
    outbound: UnboundedSender<SyncMessage>,
}

impl ProxyBehavior {
    pub fn new(outbound: UnboundedSender<SyncMessage>) -> Self {
        Self { outbound }
    }
}

impl SeatBehavior for ProxyBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Proxy
    }

    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>> {
        let seat = view.seat();
        self.outbound
            .send(SyncMessage::SeatPrompt {
                seat,
                prompt: prompt.clone(),
            })
            .map_err(|_| EngineError::MissingCollaborator {
                seat: Some(seat),
                collaborator: "sync gateway",
            })?;
        Ok(Decision::Deferred)
    }
}

/// 简单策略
///
/// - 能胡就胡
/// - 能杠就杠，能碰就碰，能吃就吃
/// - 能报听就报听
/// - 优先打定缺门，其次打最孤立的牌
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleStrategy;

impl SimpleStrategy {
    /// 孤立度：同种牌和相邻牌越少越孤立（分数越低）
    fn connectivity(state: &SeatState, tile: Tile) -> u8 {
        let hand = &state.hand;
        let mut score = hand.tile_count(tile).saturating_sub(1) * 2;
        for delta in [-2i8, -1, 1, 2] {
            if let Some(near) = tile.offset(delta) {
                score += hand.tile_count(near).min(1);
            }
        }
        score
    }

    /// 在候选中选出最孤立的牌
    fn most_isolated(state: &SeatState, candidates: TileKindSet) -> Option<Tile> {
        candidates
            .iter()
            .min_by_key(|&tile| (Self::connectivity(state, tile), !tile.is_honor(), tile.kind_index()))
    }

    fn pick_throw(state: &SeatState, allowed: TileKindSet) -> EngineResult<Tile> {
        if state.ready {
            if let Some(tile) = state.new_tile.filter(|t| allowed.contains(*t)) {
                return Ok(tile);
            }
        }
        let candidates = if allowed.is_empty() {
            state.hand.distinct_tiles().into_iter().collect()
        } else {
            allowed
        };
        Self::most_isolated(state, candidates).ok_or_else(|| EngineError::InvalidPhase {
            seat: Some(state.seat),
            expected: "a non-empty hand to throw from",
            actual: "empty hand".to_string(),
        })
    }

    fn pick_void(state: &SeatState) -> Suit {
        VoidSuitRules::auto_choice(&state.hand)
    }
}

impl SeatBehavior for SimpleStrategy {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Scripted
    }

    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>> {
        let state = view.state;
        let choice = match prompt {
            Prompt::VoidSuit => Choice::VoidSuit {
                suit: Self::pick_void(state),
            },
            Prompt::Actions { pending, .. } => {
                let turn = if pending.hu {
                    TurnChoice::Hu
                } else if let Some(gang) = pending.gangs.first() {
                    TurnChoice::Gang { tile: gang.tile }
                } else if let Some(discard) = Self::most_isolated(state, pending.ting) {
                    TurnChoice::Ting { discard }
                } else {
                    TurnChoice::Pass
                };
                Choice::Turn { turn }
            }
            Prompt::Throw { allowed, .. } => Choice::Throw {
                tile: Self::pick_throw(state, *allowed)?,
            },
            Prompt::Claim { granted, .. } => {
                let claim = if granted.hu {
                    ClaimChoice::Hu
                } else if !granted.gangs.is_empty() {
                    ClaimChoice::Gang
                } else if granted.peng {
                    ClaimChoice::Peng
                } else if let Some(option) = granted.chi.first() {
                    ClaimChoice::Chi {
                        position: option.position,
                    }
                } else {
                    ClaimChoice::Pass
                };
                Choice::Claim { claim }
            }
        };
        Ok(Decision::Now(choice))
    }
}

/// 闭包行为（用于测试和脚本）
pub struct FnBehavior<F>
where
    F: FnMut(&SeatView<'_>, &Prompt) -> Choice + Send,
{
    decide: F,
}

impl<F> FnBehavior<F>
where
    F: FnMut(&SeatView<'_>, &Prompt) -> Choice + Send,
{
    pub fn new(decide: F) -> Self {
        Self { decide }
    }
}

impl<F> SeatBehavior for FnBehavior<F>
where
    F: FnMut(&SeatView<'_>, &Prompt) -> Choice + Send,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Scripted
    }

    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>> {
        Ok(Decision::Now((self.decide)(view, prompt)))
    }
}
