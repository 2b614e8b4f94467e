use super::hand::{Hand, TileCounts};
use super::tile::{Suit, Tile};
use crate::utils::TileKindSet;
use smallvec::SmallVec;

/// 胡牌判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinResult {
    /// 是否胡牌
    pub is_win: bool,
    /// 胡牌类型
    pub win_type: WinType,
    /// 将牌（七对、十三幺为 None）
    pub pair: Option<Tile>,
    /// 顺子/刻子组合
    pub groups: SmallVec<[Group; 4]>,
    /// 财神替代的牌（按替代顺序）
    pub substitutions: SmallVec<[Tile; 4]>,
}

impl WinResult {
    fn no_win() -> Self {
        Self {
            is_win: false,
            win_type: WinType::Normal,
            pair: None,
            groups: SmallVec::new(),
            substitutions: SmallVec::new(),
        }
    }
}

/// 胡牌类型
///
/// 只区分牌型结构，不计番
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WinType {
    /// 平胡（1 个将 + (4 - 副露数) 个顺子/刻子）
    Normal,
    /// 七对
    SevenPairs,
    /// 十三幺
    ThirteenOrphans,
}

/// 牌组（顺子或刻子）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// 顺子（连续三张牌）
    Sequence { suit: Suit, start: u8 },
    /// 刻子（三张相同牌）
    Triplet { tile: Tile },
}

/// 判定约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// 是否允许七对
    pub allow_seven_pairs: bool,
    /// 是否允许十三幺
    pub allow_thirteen_orphans: bool,
    /// 必须打完的缺门（手中还有该花色则不能胡）
    pub void_suit: Option<Suit>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            allow_seven_pairs: true,
            allow_thirteen_orphans: true,
            void_suit: None,
        }
    }
}

/// 胡牌判定器
///
/// 纯算法：不持有任何牌局状态。
///
/// # 算法
///
/// 1. 牌数检查：判胡要求 `14 - 3×副露数` 张，听牌查询要求 `13 - 3×副露数` 张
/// 2. 缺门检查
/// 3. 财神：枚举所有替代组合（牌池中可重复选取 W 次），任一组合成立即胡
/// 4. 每个具体组合依次检查：七对、十三幺、基本胡牌型（递归回溯拆分）
#[derive(Debug, Clone)]
pub struct HandEvaluator {
    options: EvalOptions,
    /// 财神牌种
    wildcard: Option<Tile>,
    /// 候选牌池（规则允许的牌种）
    pool: TileKindSet,
}

impl HandEvaluator {
    /// 创建判定器（全部 34 种牌，无财神）
    pub fn new() -> Self {
        Self::with_pool(TileKindSet::all())
    }

    pub fn with_pool(pool: TileKindSet) -> Self {
        Self {
            options: EvalOptions::default(),
            wildcard: None,
            pool,
        }
    }

    pub fn options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn wildcard(mut self, wildcard: Option<Tile>) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn void_suit(mut self, void_suit: Option<Suit>) -> Self {
        self.options.void_suit = void_suit;
        self
    }

    pub fn pool(&self) -> TileKindSet {
        self.pool
    }

    /// 不考虑财神的完整性判定
    ///
    /// `counts` 的总数必须为 `14 - 3×meld_count`
    pub fn is_complete(&self, counts: &TileCounts, meld_count: u8) -> bool {
        self.evaluate_concrete(counts, meld_count).is_some()
    }

    /// 判定手牌是否胡牌（支持财神替代）
    pub fn check(&self, hand: &Hand, meld_count: u8) -> WinResult {
        let Some(expected) = Self::expected_size(14, meld_count) else {
            return WinResult::no_win();
        };
        if hand.total_count() != expected {
            return WinResult::no_win();
        }
        self.check_counts(hand.counts(), meld_count)
    }

    /// 判定手牌加上一张牌后是否胡牌（不修改原手牌）
    pub fn check_with(&self, hand: &Hand, tile: Tile, meld_count: u8) -> WinResult {
        if hand.tile_count(tile) >= Tile::COPIES {
            return WinResult::no_win();
        }
        let mut test_hand = hand.clone();
        test_hand.add_tile(tile);
        self.check(&test_hand, meld_count)
    }

    /// 查询 13 张（扣除副露）手牌的所有和张
    ///
    /// 逐一尝试牌池中的每种牌：加入一张后能胡则记入结果。
    /// 结果为集合，天然去重，与枚举顺序无关
    pub fn find_completing_tiles(&self, hand: &Hand, meld_count: u8) -> TileKindSet {
        let mut result = TileKindSet::empty();
        let Some(expected) = Self::expected_size(13, meld_count) else {
            return result;
        };
        if hand.total_count() != expected {
            return result;
        }

        let mut counts = *hand.counts();
        for index in self.pool.indices() {
            // 超过物理上限的候选无效
            if counts[index] >= Tile::COPIES {
                continue;
            }
            counts[index] += 1;
            if self.check_counts(&counts, meld_count).is_win {
                if let Some(tile) = Tile::from_kind_index(index) {
                    result.insert(tile);
                }
            }
            counts[index] -= 1;
        }
        result
    }

    /// 是否听牌
    pub fn is_ready(&self, hand: &Hand, meld_count: u8) -> bool {
        !self.find_completing_tiles(hand, meld_count).is_empty()
    }

    fn expected_size(base: usize, meld_count: u8) -> Option<usize> {
        base.checked_sub(3 * meld_count as usize)
    }

    /// 处理财神：移除财神后枚举替代组合
    fn check_counts(&self, counts: &TileCounts, meld_count: u8) -> WinResult {
        let mut base = *counts;
        let wildcard_count = match self.wildcard {
            Some(wildcard) => {
                let index = wildcard.kind_index();
                let n = base[index];
                base[index] = 0;
                n
            }
            None => 0,
        };

        if let Some(void_suit) = self.options.void_suit {
            if base[void_suit.index_range()].iter().any(|&c| c > 0) {
                return WinResult::no_win();
            }
        }

        if wildcard_count == 0 {
            return self.evaluate_concrete(&base, meld_count).unwrap_or_else(WinResult::no_win);
        }

        let candidates: SmallVec<[usize; 36]> = self.pool.indices().collect();
        let mut chosen: SmallVec<[usize; 4]> = SmallVec::new();
        self.search_substitutions(&mut base, &candidates, 0, wildcard_count, &mut chosen, meld_count)
            .unwrap_or_else(WinResult::no_win)
    }

    /// 枚举财神替代（多重组合，下标不减，避免重复检查同一组合）
    fn search_substitutions(
        &self,
        counts: &mut TileCounts,
        candidates: &[usize],
        from: usize,
        remaining: u8,
        chosen: &mut SmallVec<[usize; 4]>,
        meld_count: u8,
    ) -> Option<WinResult> {
        if remaining == 0 {
            let mut result = self.evaluate_concrete(counts, meld_count)?;
            result.substitutions = chosen.iter().filter_map(|&i| Tile::from_kind_index(i)).collect();
            return Some(result);
        }

        for (offset, &index) in candidates[from..].iter().enumerate() {
            if counts[index] >= Tile::COPIES {
                continue;
            }
            counts[index] += 1;
            chosen.push(index);
            let found = self.search_substitutions(
                counts,
                candidates,
                from + offset,
                remaining - 1,
                chosen,
                meld_count,
            );
            chosen.pop();
            counts[index] -= 1;
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// 具体牌型判定（不含财神）
    fn evaluate_concrete(&self, counts: &TileCounts, meld_count: u8) -> Option<WinResult> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        let expected = Self::expected_size(14, meld_count)?;
        if total != expected {
            return None;
        }

        // 特殊牌型只在门清时成立
        if meld_count == 0 {
            if self.options.allow_seven_pairs && is_seven_pairs(counts) {
                return Some(special(WinType::SevenPairs));
            }
            if self.options.allow_thirteen_orphans && is_thirteen_orphans(counts) {
                return Some(special(WinType::ThirteenOrphans));
            }
        }

        let groups_needed = 4usize.checked_sub(meld_count as usize)?;
        let mut work = *counts;
        for index in 0..Tile::KIND_COUNT {
            if work[index] < 2 {
                continue;
            }
            work[index] -= 2;
            let mut groups = SmallVec::new();
            let ok = strip_groups(&mut work, 0, &mut groups) && groups.len() == groups_needed;
            work[index] += 2;
            if ok {
                return Some(WinResult {
                    is_win: true,
                    win_type: WinType::Normal,
                    pair: Tile::from_kind_index(index),
                    groups,
                    substitutions: SmallVec::new(),
                });
            }
        }
        None
    }
}

impl Default for HandEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn special(win_type: WinType) -> WinResult {
    WinResult {
        is_win: true,
        win_type,
        pair: None,
        groups: SmallVec::new(),
        substitutions: SmallVec::new(),
    }
}

/// 递归拆分顺子/刻子
///
/// 总是处理最小的非零索引：该牌要么做刻子，要么做顺子的首张
fn strip_groups(counts: &mut TileCounts, start: usize, groups: &mut SmallVec<[Group; 4]>) -> bool {
    let Some(index) = (start..Tile::KIND_COUNT).find(|&i| counts[i] > 0) else {
        return true;
    };
    let Some(tile) = Tile::from_kind_index(index) else {
        return false;
    };

    if counts[index] >= 3 {
        counts[index] -= 3;
        groups.push(Group::Triplet { tile });
        let ok = strip_groups(counts, index, groups);
        counts[index] += 3;
        if ok {
            return true;
        }
        groups.pop();
    }

    // 顺子：数牌且不跨花色
    let position = index % 9;
    if !tile.is_honor() && position <= 6 && counts[index + 1] > 0 && counts[index + 2] > 0 {
        counts[index] -= 1;
        counts[index + 1] -= 1;
        counts[index + 2] -= 1;
        groups.push(Group::Sequence {
            suit: tile.suit(),
            start: tile.rank(),
        });
        let ok = strip_groups(counts, index, groups);
        counts[index] += 1;
        counts[index + 1] += 1;
        counts[index + 2] += 1;
        if ok {
            return true;
        }
        groups.pop();
    }

    false
}

/// 七对：每种出现的牌恰为 2 或 4 张，共 7 对
fn is_seven_pairs(counts: &TileCounts) -> bool {
    let mut pairs = 0u8;
    for &count in counts.iter() {
        match count {
            0 => {}
            2 => pairs += 1,
            4 => pairs += 2,
            _ => return false,
        }
    }
    pairs == 7
}

/// 十三幺：13 种幺九牌各一张且其中一种再多一张，不含其他牌
fn is_thirteen_orphans(counts: &TileCounts) -> bool {
    let orphans = TileKindSet::orphans();
    let mut duplicate = false;
    for (index, &count) in counts.iter().enumerate() {
        if !orphans.contains_index(index) {
            if count > 0 {
                return false;
            }
            continue;
        }
        match count {
            1 => {}
            2 if !duplicate => duplicate = true,
            _ => return false,
        }
    }
    duplicate
}

/// 便捷函数：检查 14 张门清手牌是否胡牌
pub fn is_win(hand: &Hand) -> bool {
    HandEvaluator::new().check(hand, 0).is_win
}

/// 便捷函数：获取胡牌结果
pub fn check_win(hand: &Hand) -> WinResult {
    HandEvaluator::new().check(hand, 0)
}
