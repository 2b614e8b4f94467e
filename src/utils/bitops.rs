use crate::tile::{Suit, Tile};

/// 牌种集合（位掩码）
///
/// 使用 u64 的低 34 位表示 34 种牌，第 i 位对应种类索引 i
///
/// 用于候选牌池（规则允许的牌种）和听牌结果集合，天然去重且与枚举顺序无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TileKindSet(u64);

impl TileKindSet {
    const FULL: u64 = (1u64 << Tile::KIND_COUNT) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// 全部 34 种牌
    pub const fn all() -> Self {
        Self(Self::FULL)
    }

    /// 某一花色的全部牌种
    pub fn of_suit(suit: Suit) -> Self {
        let mut set = Self::empty();
        for index in suit.index_range() {
            set.0 |= 1 << index;
        }
        set
    }

    /// 十三幺的 13 种牌（数牌的 1、9 + 7 张字牌）
    pub fn orphans() -> Self {
        let mut set = Self::of_suit(Suit::Zi);
        for suit in Suit::suited() {
            set.0 |= 1 << suit.base_index();
            set.0 |= 1 << (suit.base_index() + 8);
        }
        set
    }

    pub fn insert(&mut self, tile: Tile) -> bool {
        let bit = 1u64 << tile.kind_index();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn remove(&mut self, tile: Tile) {
        self.0 &= !(1u64 << tile.kind_index());
    }

    #[inline]
    pub fn contains(&self, tile: Tile) -> bool {
        self.contains_index(tile.kind_index())
    }

    #[inline]
    pub fn contains_index(&self, index: usize) -> bool {
        index < Tile::KIND_COUNT && self.0 & (1u64 << index) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// 按索引升序迭代
    pub fn iter(&self) -> TileKindIter {
        TileKindIter { bits: self.0 }
    }

    /// 按索引升序返回所有牌种的索引
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|tile| tile.kind_index())
    }

    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl FromIterator<Tile> for TileKindSet {
    fn from_iter<I: IntoIterator<Item = Tile>>(iter: I) -> Self {
        let mut set = Self::empty();
        for tile in iter {
            set.insert(tile);
        }
        set
    }
}

impl IntoIterator for TileKindSet {
    type Item = Tile;
    type IntoIter = TileKindIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 位掩码迭代器：每次取出最低位
pub struct TileKindIter {
    bits: u64,
}

impl Iterator for TileKindIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Tile::from_kind_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = TileKindSet::empty();
        assert!(set.insert(Tile::Tong(3)));
        assert!(!set.insert(Tile::Tong(3)));
        assert!(set.contains(Tile::Tong(3)));
        assert!(!set.contains(Tile::Tong(4)));
        assert_eq!(set.len(), 1);

        set.remove(Tile::Tong(3));
        assert!(set.is_empty());
    }

    #[test]
    fn test_suit_sets() {
        assert_eq!(TileKindSet::of_suit(Suit::Wan).len(), 9);
        assert_eq!(TileKindSet::of_suit(Suit::Zi).len(), 7);
        assert_eq!(TileKindSet::all().len(), 34);

        let suited = Suit::suited()
            .iter()
            .fold(TileKindSet::empty(), |acc, s| acc.union(TileKindSet::of_suit(*s)));
        assert_eq!(suited.len(), 27);
        assert_eq!(TileKindSet::all().difference(suited), TileKindSet::of_suit(Suit::Zi));
    }

    #[test]
    fn test_orphans() {
        let orphans = TileKindSet::orphans();
        assert_eq!(orphans.len(), 13);
        assert!(orphans.contains(Tile::Wan(1)));
        assert!(orphans.contains(Tile::Tiao(9)));
        assert!(orphans.contains(Tile::Zi(7)));
        assert!(!orphans.contains(Tile::Tong(5)));
    }

    #[test]
    fn test_iteration_is_ordered() {
        let set: TileKindSet = [Tile::Zi(2), Tile::Wan(5), Tile::Tong(1)].into_iter().collect();
        let tiles: Vec<Tile> = set.iter().collect();
        assert_eq!(tiles, vec![Tile::Wan(5), Tile::Tong(1), Tile::Zi(2)]);
    }
}
