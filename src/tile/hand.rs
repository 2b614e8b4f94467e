use super::tile::{Suit, Tile};
use smallvec::SmallVec;

/// 34 格计数数组（每种牌一个桶）
pub type TileCounts = [u8; Tile::KIND_COUNT];

/// 手牌（Hand）
///
/// 使用 34 格计数数组存储每种牌的数量，支持 O(1) 的添加、移除和查询操作
///
/// 只记录数量不记录顺序：显示顺序由表现层决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    /// 牌的数量：索引 -> 数量（0-4）
    counts: TileCounts,
    /// 总牌数（用于快速查询）
    total_count: usize,
}

impl Hand {
    /// 创建空手牌
    pub fn new() -> Self {
        Self {
            counts: [0; Tile::KIND_COUNT],
            total_count: 0,
        }
    }

    /// 从牌列表创建手牌（超过 4 张的部分被忽略）
    pub fn from_tiles<I: IntoIterator<Item = Tile>>(tiles: I) -> Self {
        let mut hand = Self::new();
        for tile in tiles {
            hand.add_tile(tile);
        }
        hand
    }

    /// 添加一张牌
    ///
    /// # Returns
    ///
    /// - `true`：成功添加
    /// - `false`：该牌已有 4 张
    pub fn add_tile(&mut self, tile: Tile) -> bool {
        let count = &mut self.counts[tile.kind_index()];
        if *count >= Tile::COPIES {
            return false;
        }
        *count += 1;
        self.total_count += 1;
        true
    }

    /// 移除一张牌
    ///
    /// # Returns
    ///
    /// - `true`：成功移除
    /// - `false`：手牌中没有该牌
    pub fn remove_tile(&mut self, tile: Tile) -> bool {
        let count = &mut self.counts[tile.kind_index()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        self.total_count -= 1;
        true
    }

    /// 移除 n 张相同的牌（不足时不做任何修改）
    pub fn remove_n(&mut self, tile: Tile, n: u8) -> bool {
        if self.tile_count(tile) < n {
            return false;
        }
        self.counts[tile.kind_index()] -= n;
        self.total_count -= n as usize;
        true
    }

    pub fn has_tile(&self, tile: Tile) -> bool {
        self.tile_count(tile) > 0
    }

    pub fn tile_count(&self, tile: Tile) -> u8 {
        self.counts[tile.kind_index()]
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// 某花色的牌数
    pub fn suit_count(&self, suit: Suit) -> usize {
        self.counts[suit.index_range()].iter().map(|&c| c as usize).sum()
    }

    /// 是否还有某花色的牌
    pub fn has_suit(&self, suit: Suit) -> bool {
        self.suit_count(suit) > 0
    }

    /// 转换为排序后的牌向量（用于显示和调试）
    ///
    /// 排序规则：万、筒、条、字，每种内部按点数
    pub fn to_sorted_vec(&self) -> Vec<Tile> {
        let mut result = Vec::with_capacity(self.total_count);
        for (index, &count) in self.counts.iter().enumerate() {
            if let Some(tile) = Tile::from_kind_index(index) {
                result.extend(std::iter::repeat(tile).take(count as usize));
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn clear(&mut self) {
        self.counts = [0; Tile::KIND_COUNT];
        self.total_count = 0;
    }

    /// 获取所有不同的牌种（按索引顺序）
    ///
    /// 手牌通常只有 5-10 种不同的牌，使用 SmallVec 栈分配
    pub fn distinct_tiles(&self) -> SmallVec<[Tile; 14]> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .filter_map(|(index, _)| Tile::from_kind_index(index))
            .collect()
    }

    /// 计数数组（供胡牌判定使用）
    pub fn counts(&self) -> &TileCounts {
        &self.counts
    }
}

impl Default for Hand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_creation() {
        let hand = Hand::new();
        assert!(hand.is_empty());
        assert_eq!(hand.total_count(), 0);
    }

    #[test]
    fn test_hand_add_multiple() {
        let mut hand = Hand::new();
        let tile = Tile::Wan(5);

        for _ in 0..4 {
            assert!(hand.add_tile(tile));
        }
        assert_eq!(hand.total_count(), 4);
        assert_eq!(hand.tile_count(tile), 4);

        // 第 5 张应该失败
        assert!(!hand.add_tile(tile));
        assert_eq!(hand.total_count(), 4);
    }

    #[test]
    fn test_hand_remove_tile() {
        let mut hand = Hand::new();
        let tile = Tile::Tong(3);

        assert!(!hand.remove_tile(tile));

        hand.add_tile(tile);
        assert!(hand.remove_tile(tile));
        assert_eq!(hand.total_count(), 0);
        assert!(!hand.has_tile(tile));
    }

    #[test]
    fn test_remove_n_is_atomic() {
        let mut hand = Hand::from_tiles([Tile::Tiao(7), Tile::Tiao(7)]);

        // 只有两张，不能移除三张，手牌不变
        assert!(!hand.remove_n(Tile::Tiao(7), 3));
        assert_eq!(hand.tile_count(Tile::Tiao(7)), 2);

        assert!(hand.remove_n(Tile::Tiao(7), 2));
        assert!(hand.is_empty());
    }

    #[test]
    fn test_hand_to_sorted_vec() {
        let hand = Hand::from_tiles([
            Tile::Zi(1),
            Tile::Tong(5),
            Tile::Wan(3),
            Tile::Tiao(1),
            Tile::Tong(5),
        ]);

        let sorted = hand.to_sorted_vec();
        assert_eq!(
            sorted,
            vec![Tile::Wan(3), Tile::Tong(5), Tile::Tong(5), Tile::Tiao(1), Tile::Zi(1)]
        );
    }

    #[test]
    fn test_suit_count() {
        let hand = Hand::from_tiles([Tile::Wan(1), Tile::Wan(9), Tile::Tiao(2)]);
        assert_eq!(hand.suit_count(Suit::Wan), 2);
        assert!(hand.has_suit(Suit::Tiao));
        assert!(!hand.has_suit(Suit::Tong));
    }

    #[test]
    fn test_hand_distinct_tiles() {
        let hand = Hand::from_tiles([Tile::Wan(1), Tile::Wan(1), Tile::Tong(2), Tile::Tiao(3)]);
        let distinct = hand.distinct_tiles();
        assert_eq!(distinct.as_slice(), &[Tile::Wan(1), Tile::Tong(2), Tile::Tiao(3)]);
    }
}
