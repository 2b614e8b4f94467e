use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::EngineResult;
use crate::game::constants::SeatId;
use crate::game::meld::Meld;
use crate::game::player::SeatState;
use crate::tile::Tile;

/// 吃的一种组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiOption {
    /// 顺子（升序）
    pub tiles: [Tile; 3],
    /// 被吃的牌在顺子中的位置
    pub position: u8,
}

/// 碰/吃操作器
pub struct ClaimHandler;

impl ClaimHandler {
    /// 检查是否可以碰牌
    ///
    /// 碰牌条件：
    /// 1. 手牌中有两张相同的牌
    /// 2. 别人打出了第三张相同的牌
    pub fn can_peng(state: &SeatState, tile: Tile) -> bool {
        state.hand.tile_count(tile) >= 2
    }

    /// 列出所有吃的组合
    ///
    /// 只对数牌有效；每个位置（被吃的牌做顺子的首张/中张/尾张）单独列出
    ///
    /// # 参数
    ///
    /// - `state`: 座位状态
    /// - `tile`: 上家打出的牌
    pub fn chi_options(state: &SeatState, tile: Tile) -> SmallVec<[ChiOption; 3]> {
        let mut options = SmallVec::new();
        if tile.is_honor() {
            return options;
        }
        for position in 0..3u8 {
            let start = -(position as i8);
            let run: Option<SmallVec<[Tile; 3]>> = (0..3).map(|i| tile.offset(start + i)).collect();
            let Some(run) = run else {
                continue;
            };
            let holds_others = run
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position as usize)
                .all(|(_, t)| state.hand.has_tile(*t));
            if holds_others {
                options.push(ChiOption {
                    tiles: [run[0], run[1], run[2]],
                    position,
                });
            }
        }
        options
    }

    /// 执行碰牌：从手牌移除两张，加入副露
    pub fn apply_peng(state: &mut SeatState, tile: Tile, from: SeatId) -> EngineResult<Meld> {
        state.remove_concealed(tile, 2, "peng")?;
        let meld = Meld::Peng { tile, from };
        state.melds.push(meld);
        Ok(meld)
    }

    /// 执行吃：从手牌移除顺子中另外两张
    pub fn apply_chi(state: &mut SeatState, option: ChiOption, from: SeatId) -> EngineResult<Meld> {
        let others: SmallVec<[Tile; 2]> = option
            .tiles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != option.position as usize)
            .map(|(_, t)| *t)
            .collect();
        state.remove_concealed(others[0], 1, "chi")?;
        if let Err(err) = state.remove_concealed(others[1], 1, "chi") {
            state.hand.add_tile(others[0]);
            return Err(err);
        }
        let meld = Meld::Chi {
            tiles: option.tiles,
            position: option.position,
            from,
        };
        state.melds.push(meld);
        Ok(meld)
    }
}
