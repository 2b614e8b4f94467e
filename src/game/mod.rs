//! 牌局逻辑模块
//!
//! 座位状态机、候选动作仲裁、庄家轮换和牌局协调

pub mod action;
pub mod arbiter;
pub mod banker;
pub mod behavior;
pub mod claim;
pub mod constants;
pub mod coordinator;
pub mod driver;
pub mod kong;
pub mod meld;
pub mod player;
pub mod ready;
pub mod rules;
pub mod seat;
pub mod state;
pub mod tile_info;
pub mod void_suit;
