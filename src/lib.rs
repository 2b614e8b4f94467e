//! 四人麻将牌局引擎
//!
//! 座位状态机、吃碰杠胡仲裁、胡牌判定和多节点同步

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod runtime;
pub mod sync;
pub mod telemetry;
pub mod tile;
pub mod utils;

// 重新导出常用类型
pub use config::{ConfigError, EngineConfig, VoidTimeoutPolicy};
pub use engine::action_mask::{ActionMask, PendingActions};
pub use error::{EngineError, EngineResult, SyncError};
pub use game::action::{ActionKind, Choice, ClaimChoice, TakenAction, TurnChoice};
pub use game::arbiter::{ActionArbiter, Resolution};
pub use game::banker::{BankerChange, BankerState};
pub use game::behavior::{
    BehaviorKind, Decision, FnBehavior, InteractiveBehavior, PresentationEvent, Prompt, ProxyBehavior, SeatBehavior,
    SeatView, SimpleStrategy,
};
pub use game::constants::{EventId, SeatId, NUM_SEATS};
pub use game::coordinator::{Dispatch, RoundCoordinator};
pub use game::driver::{DriverStatus, RoundDriver};
pub use game::meld::{GangKind, Meld};
pub use game::player::{SeatPhase, SeatState};
pub use game::rules::{BankerPolicy, RoundRules, Ruleset, RulesetConfig, RulesetKind, WildcardRule};
pub use game::seat::{Seat, SeatCommand, SeatReport};
pub use game::state::{
    ActionNotice, DrawReason, RoundOutcome, RoundPhase, RoundRecord, RoundState, RoundSummary, WinRecord, WinSource,
};
pub use game::tile_info::{TileInfo, TileOrigin};
pub use runtime::{RoundRuntime, RuntimeHandle, SideEffectSink};
pub use sync::{Envelope, SyncGateway, SyncMessage};
pub use tile::{HandEvaluator, Hand, Suit, Tile, Wall, WinType};
pub use utils::TileKindSet;
