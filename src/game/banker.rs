use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::constants::{next_seat, SeatId};
use crate::game::rules::BankerPolicy;
use crate::game::state::RoundOutcome;

/// 庄家状态（跨局保留，只在一局结束时修改）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerState {
    /// 当前庄家
    pub seat: SeatId,
    /// 连庄次数
    pub streak: u32,
    /// 第一局的庄家（庄家转回这里算一圈）
    pub initial: SeatId,
}

/// 一局结束后的换庄结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankerChange {
    pub previous: SeatId,
    pub current: SeatId,
    pub streak: u32,
    /// 庄家转回了第一局的庄家
    pub wrapped: bool,
}

impl BankerState {
    pub fn new(seat: SeatId) -> Self {
        Self {
            seat,
            streak: 0,
            initial: seat,
        }
    }

    /// 按换庄规则决定下一局的庄家
    ///
    /// # 参数
    ///
    /// - `policy`: 换庄规则
    /// - `repeat_on_draw`: 流局时是否连庄
    /// - `outcome`: 本局结果
    pub fn succeed(&mut self, policy: BankerPolicy, repeat_on_draw: bool, outcome: &RoundOutcome) -> BankerChange {
        let previous = self.seat;
        let next = match outcome {
            RoundOutcome::Normal { wins } => {
                let banker_won = wins.iter().any(|win| win.seat == previous);
                match policy {
                    BankerPolicy::WinnerKeeps => wins.first().map_or(previous, |win| win.seat),
                    BankerPolicy::NextSeatAlways if banker_won => previous,
                    BankerPolicy::NextSeatAlways => next_seat(previous),
                }
            }
            RoundOutcome::Drawn { .. } if repeat_on_draw => previous,
            RoundOutcome::Drawn { .. } => next_seat(previous),
            RoundOutcome::PlayerQuit { .. } => previous,
        };

        let wrapped = next != previous && next == self.initial;
        // 中途退出的一局不算连庄
        let quit = matches!(outcome, RoundOutcome::PlayerQuit { .. });
        if next == previous {
            if !quit {
                self.streak += 1;
            }
        } else {
            self.seat = next;
            self.streak = 0;
        }
        info!(previous, current = self.seat, streak = self.streak, wrapped, "banker succession");
        BankerChange {
            previous,
            current: self.seat,
            streak: self.streak,
            wrapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{DrawReason, WinRecord, WinSource};
    use crate::tile::{Tile, WinType};

    fn win(seat: SeatId) -> WinRecord {
        WinRecord {
            seat,
            tile: Tile::Wan(1),
            source: WinSource::SelfDraw,
            pattern: WinType::Normal,
            event: 1,
        }
    }

    #[test]
    fn test_winner_keeps() {
        let mut banker = BankerState::new(0);
        let change = banker.succeed(
            BankerPolicy::WinnerKeeps,
            true,
            &RoundOutcome::Normal { wins: vec![win(0)] },
        );
        assert_eq!(change.current, 0);
        assert_eq!(banker.streak, 1);

        let change = banker.succeed(
            BankerPolicy::WinnerKeeps,
            true,
            &RoundOutcome::Normal {
                wins: vec![win(2), win(3)],
            },
        );
        assert_eq!(change.current, 2);
        assert_eq!(banker.streak, 0);
    }

    #[test]
    fn test_next_seat_always() {
        let mut banker = BankerState::new(1);
        banker.succeed(
            BankerPolicy::NextSeatAlways,
            false,
            &RoundOutcome::Normal {
                wins: vec![win(3), win(1)],
            },
        );
        assert_eq!(banker.seat, 1);
        assert_eq!(banker.streak, 1);

        banker.succeed(
            BankerPolicy::NextSeatAlways,
            false,
            &RoundOutcome::Normal { wins: vec![win(3)] },
        );
        assert_eq!(banker.seat, 2);
    }

    #[test]
    fn test_drawn_round_and_wrap() {
        let mut banker = BankerState::new(3);
        let drawn = RoundOutcome::Drawn {
            reason: DrawReason::WallExhausted,
        };
        banker.succeed(BankerPolicy::WinnerKeeps, true, &drawn);
        assert_eq!(banker.seat, 3);

        let change = banker.succeed(BankerPolicy::NextSeatAlways, false, &drawn);
        assert_eq!(change.current, 0);
        assert!(!change.wrapped);
        banker.succeed(BankerPolicy::NextSeatAlways, false, &drawn);
        banker.succeed(BankerPolicy::NextSeatAlways, false, &drawn);
        let change = banker.succeed(BankerPolicy::NextSeatAlways, false, &drawn);
        assert_eq!(change.current, 3);
        assert!(change.wrapped);
    }

    #[test]
    fn test_quit_keeps_banker_and_streak() {
        let mut banker = BankerState::new(2);
        banker.succeed(
            BankerPolicy::WinnerKeeps,
            true,
            &RoundOutcome::Normal { wins: vec![win(2)] },
        );
        assert_eq!(banker.streak, 1);

        let change = banker.succeed(BankerPolicy::WinnerKeeps, true, &RoundOutcome::PlayerQuit { seat: 0 });
        assert_eq!(change.current, 2);
        assert_eq!(change.streak, 1);
        assert!(!change.wrapped);
    }
}
