use super::tile::Tile;
use crate::utils::TileKindSet;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 牌墙（Wall）
///
/// 正常摸牌从前端取，杠后补牌从后端取。
/// 翻出的"亮牌"停留在后端第一张，即下一张杠后补牌。
#[derive(Debug, Clone)]
pub struct Wall {
    tiles: Vec<Tile>,
    /// 前端下一张的位置
    front: usize,
    /// 后端边界（不含）
    back: usize,
    /// 亮牌是否仍在牌墙中（位于 back - 1）
    shown: bool,
}

impl Wall {
    /// 按牌池创建一副完整的牌墙（每种 4 张，未洗牌）
    pub fn new(pool: TileKindSet) -> Self {
        let mut tiles = Vec::with_capacity(pool.len() * Tile::COPIES as usize);
        for tile in pool {
            for _ in 0..Tile::COPIES {
                tiles.push(tile);
            }
        }
        Self::from_tiles(tiles)
    }

    /// 按给定顺序创建牌墙（用于镜像权威节点的牌序以及测试中构造牌局）
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        let back = tiles.len();
        Self {
            tiles,
            front: 0,
            back,
            shown: false,
        }
    }

    /// 洗牌（线程随机数）
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut thread_rng());
    }

    /// 使用固定种子洗牌，同一种子得到同一牌序
    pub fn shuffle_seeded(&mut self, seed: u64) {
        self.shuffle_with(&mut ChaCha8Rng::seed_from_u64(seed));
    }

    /// Fisher-Yates 洗牌，重置摸牌位置
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tiles.shuffle(rng);
        self.front = 0;
        self.back = self.tiles.len();
        self.shown = false;
    }

    /// 从前端摸一张牌
    pub fn draw(&mut self) -> Option<Tile> {
        if self.front >= self.back {
            return None;
        }
        let tile = self.tiles[self.front];
        self.front += 1;
        if self.front == self.back {
            self.shown = false;
        }
        Some(tile)
    }

    /// 从后端摸一张牌（杠后补牌）
    pub fn draw_back(&mut self) -> Option<Tile> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.shown = false;
        Some(self.tiles[self.back])
    }

    /// 翻开后端第一张作为亮牌
    ///
    /// 亮牌仍留在牌墙中，是下一张杠后补牌
    pub fn reveal_shown_tile(&mut self) -> Option<Tile> {
        if self.front >= self.back {
            return None;
        }
        self.shown = true;
        Some(self.tiles[self.back - 1])
    }

    /// 当前仍在牌墙中的亮牌
    pub fn shown_tile(&self) -> Option<Tile> {
        if self.shown && self.front < self.back {
            Some(self.tiles[self.back - 1])
        } else {
            None
        }
    }

    /// 查看下一张杠后补牌（不摸出）
    pub fn peek_back(&self) -> Option<Tile> {
        if self.front < self.back {
            Some(self.tiles[self.back - 1])
        } else {
            None
        }
    }

    /// 剩余可摸牌数
    pub fn remaining_count(&self) -> usize {
        self.back.saturating_sub(self.front)
    }

    /// 剩余牌数是否已到达保留张数
    pub fn is_exhausted(&self, least_remaining: usize) -> bool {
        self.remaining_count() <= least_remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_count() == 0
    }

    pub fn drawn_count(&self) -> usize {
        self.front + (self.tiles.len() - self.back)
    }

    pub fn total_count(&self) -> usize {
        self.tiles.len()
    }

    /// 剩余牌（前端到后端顺序），用于向非权威节点同步牌序
    pub fn live_tiles(&self) -> &[Tile] {
        &self.tiles[self.front..self.back]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Suit;
    use std::collections::HashMap;

    fn suited_pool() -> TileKindSet {
        Suit::suited()
            .iter()
            .fold(TileKindSet::empty(), |acc, s| acc.union(TileKindSet::of_suit(*s)))
    }

    #[test]
    fn test_wall_creation() {
        assert_eq!(Wall::new(TileKindSet::all()).total_count(), 136);
        let wall = Wall::new(suited_pool());
        assert_eq!(wall.total_count(), 108);
        assert_eq!(wall.remaining_count(), 108);
        assert!(!wall.is_empty());
    }

    #[test]
    fn test_wall_tile_distribution() {
        let wall = Wall::new(TileKindSet::all());
        let mut counts = HashMap::new();
        for tile in wall.live_tiles() {
            *counts.entry(*tile).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 34);
        assert!(counts.values().all(|&c| c == 4));
    }

    #[test]
    fn test_draw_front_and_back() {
        let mut wall = Wall::from_tiles(vec![Tile::Wan(1), Tile::Wan(2), Tile::Wan(3)]);
        assert_eq!(wall.draw(), Some(Tile::Wan(1)));
        assert_eq!(wall.draw_back(), Some(Tile::Wan(3)));
        assert_eq!(wall.remaining_count(), 1);
        assert_eq!(wall.drawn_count(), 2);
        assert_eq!(wall.draw(), Some(Tile::Wan(2)));
        assert!(wall.draw().is_none());
        assert!(wall.draw_back().is_none());
    }

    #[test]
    fn test_shown_tile_is_next_replacement() {
        let mut wall = Wall::from_tiles(vec![Tile::Wan(1), Tile::Tong(2), Tile::Zi(5)]);
        assert_eq!(wall.reveal_shown_tile(), Some(Tile::Zi(5)));
        assert_eq!(wall.shown_tile(), Some(Tile::Zi(5)));

        // 前端摸牌不影响亮牌
        wall.draw();
        assert_eq!(wall.shown_tile(), Some(Tile::Zi(5)));

        // 杠后补牌摸走亮牌
        assert_eq!(wall.draw_back(), Some(Tile::Zi(5)));
        assert!(wall.shown_tile().is_none());
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut wall1 = Wall::new(TileKindSet::all());
        let mut wall2 = Wall::new(TileKindSet::all());
        wall1.shuffle_seeded(42);
        wall2.shuffle_seeded(42);
        assert_eq!(wall1.live_tiles(), wall2.live_tiles());
    }

    #[test]
    fn test_exhaustion_respects_reserve() {
        let mut wall = Wall::from_tiles(vec![Tile::Wan(1); 4]);
        assert!(!wall.is_exhausted(2));
        wall.draw();
        wall.draw();
        assert!(wall.is_exhausted(2));
    }
}
