/// 通用工具
pub mod bitops;

pub use bitops::{TileKindIter, TileKindSet};
