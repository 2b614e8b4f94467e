use smallvec::SmallVec;
use tracing::debug;

use crate::engine::action_mask::PendingActions;
use crate::game::action::ActionKind;
use crate::game::constants::{distance_from, next_seat, SeatId, NUM_SEATS};

/// 一个牌事件的仲裁结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 没有人要这张牌
    NoClaim,
    /// 获准的座位及其动作（从出牌者的下家开始按出牌顺序排列）
    Granted(SmallVec<[(SeatId, PendingActions); 3]>),
}

impl Resolution {
    pub fn seats(&self) -> SmallVec<[SeatId; 3]> {
        match self {
            Resolution::NoClaim => SmallVec::new(),
            Resolution::Granted(grants) => grants.iter().map(|(seat, _)| *seat).collect(),
        }
    }
}

/// 动作仲裁器（无状态）
///
/// 优先级：胡 > 杠 > 碰 > 吃
pub struct ActionArbiter;

impl ActionArbiter {
    /// 仲裁一张打出的牌
    ///
    /// - 没有人有候选动作：`NoClaim`
    /// - 只有一家有候选动作：这一家的全部候选动作同时获准
    /// - 多家有候选动作：按优先级找到第一个有人声明的动作种类，
    ///   声明了该动作的所有座位都获准（一炮多响），其余声明作废
    ///
    /// # 参数
    ///
    /// - `origin`: 出牌的座位
    /// - `collected`: 各座位上报的候选动作
    pub fn resolve_discard(origin: SeatId, collected: &[(SeatId, PendingActions)]) -> Resolution {
        let mut claimants: SmallVec<[&(SeatId, PendingActions); 3]> =
            collected.iter().filter(|(_, pending)| !pending.kinds().is_empty()).collect();
        claimants.sort_by_key(|(seat, _)| distance_from(origin, *seat));

        match claimants.as_slice() {
            [] => Resolution::NoClaim,
            [(seat, pending)] => {
                let mut granted = pending.clone();
                granted.ting = Default::default();
                debug!(origin, seat = *seat, actions = ?granted.kinds(), "single claimant granted");
                Resolution::Granted(SmallVec::from_iter([(*seat, granted)]))
            }
            _ => {
                for kind in ActionKind::PRIORITY {
                    let grants: SmallVec<[(SeatId, PendingActions); 3]> = claimants
                        .iter()
                        .filter(|(_, pending)| pending.has(kind))
                        .map(|(seat, pending)| (*seat, pending.only(kind)))
                        .collect();
                    if !grants.is_empty() {
                        debug!(origin, action = %kind, seats = ?grants.iter().map(|g| g.0).collect::<Vec<_>>(), "claim arbitrated");
                        return Resolution::Granted(grants);
                    }
                }
                Resolution::NoClaim
            }
        }
    }

    /// 仲裁抢杠：只考虑胡，能抢的座位全部获准
    pub fn resolve_rob_kong(origin: SeatId, collected: &[(SeatId, PendingActions)]) -> Resolution {
        let mut grants: SmallVec<[(SeatId, PendingActions); 3]> = collected
            .iter()
            .filter(|(_, pending)| pending.hu)
            .map(|(seat, pending)| (*seat, pending.only(ActionKind::Hu)))
            .collect();
        grants.sort_by_key(|(seat, _)| distance_from(origin, *seat));
        if grants.is_empty() {
            Resolution::NoClaim
        } else {
            debug!(origin, seats = ?grants.iter().map(|g| g.0).collect::<Vec<_>>(), "rob kong granted");
            Resolution::Granted(grants)
        }
    }

    /// 胡牌后下一个摸牌的座位
    ///
    /// 从 `origin` 出发按出牌顺序，跳过最后一个胡牌的座位之后的第一个仍在局中的座位。
    /// 没有胡牌座位时即 `origin` 的下家。所有座位都不在局中时返回 `None`
    pub fn next_drawer(origin: SeatId, winners: &[SeatId], active: impl Fn(SeatId) -> bool) -> Option<SeatId> {
        let last = winners
            .iter()
            .copied()
            .max_by_key(|seat| {
                let distance = distance_from(origin, *seat);
                // 自摸时胡牌者就是 origin，距离按一整圈计算
                if distance == 0 {
                    NUM_SEATS
                } else {
                    distance
                }
            })
            .unwrap_or(origin);

        let mut seat = next_seat(last);
        for _ in 0..NUM_SEATS {
            if active(seat) {
                return Some(seat);
            }
            seat = next_seat(seat);
        }
        None
    }
}
