/// 牌相关模块
///
/// 包含牌（Tile）、牌墙（Wall）、手牌（Hand）和胡牌判定（HandEvaluator）

pub mod tile;
pub mod wall;
pub mod hand;
pub mod win_check;

// 重新导出常用类型
pub use tile::{Tile, Suit};
pub use wall::Wall;
pub use hand::{Hand, TileCounts};
pub use win_check::{HandEvaluator, EvalOptions, WinResult, WinType, Group, is_win, check_win};
