use std::fmt;

/// 麻将牌
///
/// 值语义：同花色同点数的两张牌完全等价，引擎从不依赖对象身份判断相等
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    /// 万子（1-9）
    Wan(u8),
    /// 筒子（1-9）
    Tong(u8),
    /// 条子（1-9）
    Tiao(u8),
    /// 字牌（1-7：东南西北中发白）
    Zi(u8),
}

impl Tile {
    /// 牌的种类数：3 种花色 × 9 + 7 张字牌
    pub const KIND_COUNT: usize = 34;

    /// 每种牌的物理张数
    pub const COPIES: u8 = 4;

    pub const MIN_RANK: u8 = 1;
    pub const MAX_RANK: u8 = 9;
    pub const MAX_HONOR_RANK: u8 = 7;

    /// 创建一张牌，验证输入有效性
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        if rank < Self::MIN_RANK || rank > suit.max_rank() {
            return None;
        }
        Some(match suit {
            Suit::Wan => Tile::Wan(rank),
            Suit::Tong => Tile::Tong(rank),
            Suit::Tiao => Tile::Tiao(rank),
            Suit::Zi => Tile::Zi(rank),
        })
    }

    /// 获取花色
    pub fn suit(&self) -> Suit {
        match self {
            Tile::Wan(_) => Suit::Wan,
            Tile::Tong(_) => Suit::Tong,
            Tile::Tiao(_) => Suit::Tiao,
            Tile::Zi(_) => Suit::Zi,
        }
    }

    /// 获取点数
    pub fn rank(&self) -> u8 {
        match self {
            Tile::Wan(r) | Tile::Tong(r) | Tile::Tiao(r) | Tile::Zi(r) => *r,
        }
    }

    /// 是否为字牌
    pub fn is_honor(&self) -> bool {
        matches!(self, Tile::Zi(_))
    }

    /// 是否为幺九牌（数牌的 1、9）
    pub fn is_terminal(&self) -> bool {
        !self.is_honor() && (self.rank() == 1 || self.rank() == 9)
    }

    /// 转换为线性种类索引（0-33）
    ///
    /// 映射规则：
    /// - 万子：0-8
    /// - 筒子：9-17
    /// - 条子：18-26
    /// - 字牌：27-33
    pub fn kind_index(&self) -> usize {
        self.suit().base_index() + (self.rank() - 1) as usize
    }

    /// 从种类索引创建牌
    pub fn from_kind_index(index: usize) -> Option<Self> {
        if index >= Self::KIND_COUNT {
            return None;
        }
        let suit = Suit::from_base(index);
        let rank = (index - suit.base_index()) as u8 + 1;
        Tile::new(suit, rank)
    }

    /// 所有 34 种牌（按索引顺序）
    pub fn all_kinds() -> impl Iterator<Item = Tile> {
        (0..Self::KIND_COUNT).filter_map(Tile::from_kind_index)
    }

    /// 同组内的下一张牌（用于翻牌定财神）
    ///
    /// 数牌 9 之后回到 1；风牌东南西北循环；箭牌中发白循环
    pub fn next_in_cycle(&self) -> Tile {
        match *self {
            Tile::Wan(r) => Tile::Wan(r % 9 + 1),
            Tile::Tong(r) => Tile::Tong(r % 9 + 1),
            Tile::Tiao(r) => Tile::Tiao(r % 9 + 1),
            Tile::Zi(r) if r <= 4 => Tile::Zi(r % 4 + 1),
            Tile::Zi(r) => Tile::Zi((r - 4) % 3 + 5),
        }
    }

    /// 检查是否可以组成顺子（连续三张）
    pub fn can_form_sequence(&self, other1: &Tile, other2: &Tile) -> bool {
        if self.is_honor() || self.suit() != other1.suit() || self.suit() != other2.suit() {
            return false;
        }
        let mut ranks = [self.rank(), other1.rank(), other2.rank()];
        ranks.sort();
        ranks[0] + 1 == ranks[1] && ranks[1] + 1 == ranks[2]
    }

    /// 同花色偏移 `delta` 点后的牌（越界返回 None，字牌不支持）
    pub fn offset(&self, delta: i8) -> Option<Tile> {
        if self.is_honor() {
            return None;
        }
        let rank = self.rank() as i8 + delta;
        if !(1..=9).contains(&rank) {
            return None;
        }
        Tile::new(self.suit(), rank as u8)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HONORS: [&str; 7] = ["东", "南", "西", "北", "中", "发", "白"];
        match self {
            Tile::Wan(r) => write!(f, "{r}万"),
            Tile::Tong(r) => write!(f, "{r}筒"),
            Tile::Tiao(r) => write!(f, "{r}条"),
            Tile::Zi(r) => write!(f, "{}", HONORS.get((*r as usize).wrapping_sub(1)).unwrap_or(&"?")),
        }
    }
}

/// 花色枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Suit {
    Wan = 0,
    Tong = 1,
    Tiao = 2,
    Zi = 3,
}

impl Suit {
    /// 三种数牌花色
    pub fn suited() -> [Suit; 3] {
        [Suit::Wan, Suit::Tong, Suit::Tiao]
    }

    /// 所有花色（含字牌）
    pub fn all() -> [Suit; 4] {
        [Suit::Wan, Suit::Tong, Suit::Tiao, Suit::Zi]
    }

    pub fn is_suited(&self) -> bool {
        !matches!(self, Suit::Zi)
    }

    /// 该花色在线性索引中的起始位置
    pub fn base_index(&self) -> usize {
        *self as usize * 9
    }

    pub fn max_rank(&self) -> u8 {
        match self {
            Suit::Zi => Tile::MAX_HONOR_RANK,
            _ => Tile::MAX_RANK,
        }
    }

    /// 该花色覆盖的索引区间
    pub fn index_range(&self) -> std::ops::Range<usize> {
        let base = self.base_index();
        base..base + self.max_rank() as usize
    }

    fn from_base(index: usize) -> Suit {
        match index / 9 {
            0 => Suit::Wan,
            1 => Suit::Tong,
            2 => Suit::Tiao,
            _ => Suit::Zi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_creation() {
        let tile = Tile::new(Suit::Wan, 1).unwrap();
        assert_eq!(tile.suit(), Suit::Wan);
        assert_eq!(tile.rank(), 1);

        // 字牌只有 1-7
        assert!(Tile::new(Suit::Zi, 7).is_some());
        assert!(Tile::new(Suit::Zi, 8).is_none());

        // 无效的 rank
        assert!(Tile::new(Suit::Wan, 0).is_none());
        assert!(Tile::new(Suit::Wan, 10).is_none());
    }

    #[test]
    fn test_kind_index_layout() {
        assert_eq!(Tile::Wan(1).kind_index(), 0);
        assert_eq!(Tile::Tong(1).kind_index(), 9);
        assert_eq!(Tile::Tiao(9).kind_index(), 26);
        assert_eq!(Tile::Zi(1).kind_index(), 27);
        assert_eq!(Tile::Zi(7).kind_index(), 33);

        for index in 0..Tile::KIND_COUNT {
            let tile = Tile::from_kind_index(index).unwrap();
            assert_eq!(tile.kind_index(), index);
        }
        assert!(Tile::from_kind_index(34).is_none());
        assert_eq!(Tile::all_kinds().count(), 34);
    }

    #[test]
    fn test_next_in_cycle() {
        assert_eq!(Tile::Wan(9).next_in_cycle(), Tile::Wan(1));
        assert_eq!(Tile::Tiao(3).next_in_cycle(), Tile::Tiao(4));
        // 北 -> 东
        assert_eq!(Tile::Zi(4).next_in_cycle(), Tile::Zi(1));
        // 白 -> 中
        assert_eq!(Tile::Zi(7).next_in_cycle(), Tile::Zi(5));
        assert_eq!(Tile::Zi(5).next_in_cycle(), Tile::Zi(6));
    }

    #[test]
    fn test_can_form_sequence() {
        assert!(Tile::Wan(1).can_form_sequence(&Tile::Wan(2), &Tile::Wan(3)));
        assert!(!Tile::Wan(1).can_form_sequence(&Tile::Wan(2), &Tile::Wan(5)));
        assert!(!Tile::Wan(1).can_form_sequence(&Tile::Wan(2), &Tile::Tong(3)));
        // 字牌不能组成顺子
        assert!(!Tile::Zi(1).can_form_sequence(&Tile::Zi(2), &Tile::Zi(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tile::Tong(5).to_string(), "5筒");
        assert_eq!(Tile::Zi(5).to_string(), "中");
    }
}
