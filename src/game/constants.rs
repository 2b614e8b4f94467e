/// 牌局常量定义
///
/// 集中管理所有魔法数字

/// 座位编号（0-3，按出牌顺序逆时针排列）
pub type SeatId = u8;

/// 牌事件编号（每个摸牌/出牌/杠牌事件递增）
pub type EventId = u64;

/// 座位数量
pub const NUM_SEATS: u8 = 4;

/// 起手牌数
pub const HAND_SIZE: usize = 13;

/// 完整牌组数（不含将牌）
pub const GROUPS_PER_HAND: u8 = 4;

/// 下家
pub fn next_seat(seat: SeatId) -> SeatId {
    (seat + 1) % NUM_SEATS
}

/// 上家
pub fn previous_seat(seat: SeatId) -> SeatId {
    (seat + NUM_SEATS - 1) % NUM_SEATS
}

/// 从 `origin` 的下家开始，按出牌顺序排列其余三家
pub fn others_in_turn_order(origin: SeatId) -> [SeatId; 3] {
    let first = next_seat(origin);
    let second = next_seat(first);
    [first, second, next_seat(second)]
}

/// `seat` 相对 `origin` 的顺时针距离（1-3，自己为 0）
pub fn distance_from(origin: SeatId, seat: SeatId) -> u8 {
    (seat + NUM_SEATS - origin) % NUM_SEATS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_order() {
        assert_eq!(next_seat(3), 0);
        assert_eq!(previous_seat(0), 3);
        assert_eq!(others_in_turn_order(2), [3, 0, 1]);
        assert_eq!(distance_from(2, 1), 3);
        assert_eq!(distance_from(1, 1), 0);
    }
}
