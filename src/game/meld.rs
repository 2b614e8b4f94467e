use serde::{Deserialize, Serialize};

use crate::game::constants::SeatId;
use crate::tile::Tile;

/// 杠的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GangKind {
    /// 暗杠：手中四张
    Concealed,
    /// 明杠：手中三张 + 别人打出的一张
    PromotedTriplet,
    /// 加杠：已碰的刻子 + 自己摸到的第四张
    PromotedPeng,
}

impl GangKind {
    /// 需要从手牌中移除的张数
    pub fn concealed_needed(&self) -> u8 {
        match self {
            GangKind::Concealed => 4,
            GangKind::PromotedTriplet => 3,
            GangKind::PromotedPeng => 1,
        }
    }
}

/// 副露（组合）
///
/// 组成副露的牌在创建时从手牌中移除，之后不再回到手牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meld {
    /// 吃：顺子，`position` 为被吃的牌在顺子中的位置（0/1/2）
    Chi {
        tiles: [Tile; 3],
        position: u8,
        from: SeatId,
    },
    /// 碰：刻子
    Peng { tile: Tile, from: SeatId },
    /// 杠：`from` 为提供最后一张的座位（暗杠为 None）
    Gang {
        tile: Tile,
        kind: GangKind,
        from: Option<SeatId>,
    },
}

impl Meld {
    /// 副露中的代表牌（吃为被吃的牌）
    pub fn tile(&self) -> Tile {
        match self {
            Meld::Chi { tiles, position, .. } => tiles[*position as usize % 3],
            Meld::Peng { tile, .. } | Meld::Gang { tile, .. } => *tile,
        }
    }

    pub fn is_gang(&self) -> bool {
        matches!(self, Meld::Gang { .. })
    }

    pub fn is_concealed(&self) -> bool {
        matches!(
            self,
            Meld::Gang {
                kind: GangKind::Concealed,
                ..
            }
        )
    }

    /// 副露包含的全部牌
    pub fn tiles(&self) -> smallvec::SmallVec<[Tile; 4]> {
        match self {
            Meld::Chi { tiles, .. } => tiles.iter().copied().collect(),
            Meld::Peng { tile, .. } => smallvec::smallvec![*tile; 3],
            Meld::Gang { tile, .. } => smallvec::smallvec![*tile; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meld_tiles() {
        let chi = Meld::Chi {
            tiles: [Tile::Wan(3), Tile::Wan(4), Tile::Wan(5)],
            position: 2,
            from: 1,
        };
        assert_eq!(chi.tile(), Tile::Wan(5));
        assert_eq!(chi.tiles().len(), 3);

        let gang = Meld::Gang {
            tile: Tile::Zi(1),
            kind: GangKind::Concealed,
            from: None,
        };
        assert!(gang.is_gang());
        assert!(gang.is_concealed());
        assert_eq!(gang.tiles().len(), 4);
        assert_eq!(GangKind::PromotedPeng.concealed_needed(), 1);
    }
}
