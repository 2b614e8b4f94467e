use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tile::{EvalOptions, Hand, HandEvaluator, Suit, Tile};
use crate::utils::TileKindSet;

/// 玩法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetKind {
    /// 136 张，吃碰杠，七对和十三幺，赢家坐庄
    Classic,
    /// 血战到底：108 张，定缺，不能吃，胡牌后继续
    BloodBattle,
    /// 翻牌定财神：只能自摸，最多 4 杠
    Wildcard,
    /// 报听：必须先听牌才能胡，保留 14 张牌尾
    DeclaredReady,
}

impl RulesetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetKind::Classic => "classic",
            RulesetKind::BloodBattle => "blood_battle",
            RulesetKind::Wildcard => "wildcard",
            RulesetKind::DeclaredReady => "declared_ready",
        }
    }
}

impl fmt::Display for RulesetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RulesetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(RulesetKind::Classic),
            "blood_battle" | "bloodbattle" => Ok(RulesetKind::BloodBattle),
            "wildcard" => Ok(RulesetKind::Wildcard),
            "declared_ready" | "declaredready" => Ok(RulesetKind::DeclaredReady),
            other => Err(format!("unknown ruleset `{other}`")),
        }
    }
}

/// 财神规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardRule {
    /// 无财神
    None,
    /// 亮牌的下一张（同组循环）为财神
    NextOfShown,
}

/// 坐庄规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankerPolicy {
    /// 赢家坐庄（庄家赢则连庄）
    WinnerKeeps,
    /// 庄家赢则连庄，否则轮到下家
    NextSeatAlways,
}

/// 玩法配置
///
/// 扁平的数据结构：各玩法只是不同的取值组合，共享默认值通过结构体更新语法组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetConfig {
    pub kind: RulesetKind,
    /// 是否包含字牌
    pub include_honors: bool,
    pub allow_chi: bool,
    pub allow_peng: bool,
    pub allow_gang: bool,
    /// 是否必须定缺
    pub requires_void_suit: bool,
    /// 是否必须先报听才能胡
    pub requires_ready_declaration: bool,
    /// 是否只能自摸
    pub self_draw_only: bool,
    /// 有人胡牌后牌局是否继续（胡牌者离场）
    pub continue_after_win: bool,
    /// 胡牌者是否留在牌局中并可再次胡牌
    pub allow_repeat_win: bool,
    /// 开局是否翻出亮牌
    pub reveal_shown_tile: bool,
    pub wildcard_rule: WildcardRule,
    pub banker_policy: BankerPolicy,
    /// 流局时庄家是否连庄
    pub repeat_banker_on_draw: bool,
    /// 杠数上限（达到上限后补牌不能胡则流局）
    pub max_kongs: Option<u8>,
    pub allow_seven_pairs: bool,
    pub allow_thirteen_orphans: bool,
    /// 暗杠是否可抢（仅限十三幺）
    pub allow_rob_concealed_kong: bool,
    /// 牌尾保留张数
    pub reserve_tiles: usize,
}

impl RulesetConfig {
    /// 按玩法构造配置
    pub fn for_kind(kind: RulesetKind) -> Self {
        let classic = Self {
            kind: RulesetKind::Classic,
            include_honors: true,
            allow_chi: true,
            allow_peng: true,
            allow_gang: true,
            requires_void_suit: false,
            requires_ready_declaration: false,
            self_draw_only: false,
            continue_after_win: false,
            allow_repeat_win: false,
            reveal_shown_tile: false,
            wildcard_rule: WildcardRule::None,
            banker_policy: BankerPolicy::WinnerKeeps,
            repeat_banker_on_draw: true,
            max_kongs: None,
            allow_seven_pairs: true,
            allow_thirteen_orphans: true,
            allow_rob_concealed_kong: false,
            reserve_tiles: 0,
        };

        match kind {
            RulesetKind::Classic => classic,
            RulesetKind::BloodBattle => Self {
                kind,
                include_honors: false,
                allow_chi: false,
                requires_void_suit: true,
                continue_after_win: true,
                allow_thirteen_orphans: false,
                banker_policy: BankerPolicy::NextSeatAlways,
                repeat_banker_on_draw: false,
                ..classic
            },
            RulesetKind::Wildcard => Self {
                kind,
                self_draw_only: true,
                reveal_shown_tile: true,
                wildcard_rule: WildcardRule::NextOfShown,
                max_kongs: Some(4),
                ..classic
            },
            RulesetKind::DeclaredReady => Self {
                kind,
                requires_ready_declaration: true,
                allow_rob_concealed_kong: true,
                reserve_tiles: 14,
                ..classic
            },
        }
    }

    /// 规则允许的牌种
    pub fn tile_pool(&self) -> TileKindSet {
        if self.include_honors {
            TileKindSet::all()
        } else {
            TileKindSet::all().difference(TileKindSet::of_suit(Suit::Zi))
        }
    }

    /// 按当前约束构造胡牌判定器
    pub fn evaluator(&self, wildcard: Option<Tile>, void_suit: Option<Suit>) -> HandEvaluator {
        HandEvaluator::with_pool(self.tile_pool())
            .options(EvalOptions {
                allow_seven_pairs: self.allow_seven_pairs,
                allow_thirteen_orphans: self.allow_thirteen_orphans,
                void_suit,
            })
            .wildcard(wildcard)
    }
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self::for_kind(RulesetKind::Classic)
    }
}

/// 发给座位的本局规则快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRules {
    pub config: RulesetConfig,
    pub wildcard: Option<Tile>,
}

impl RoundRules {
    pub fn new(config: RulesetConfig) -> Self {
        Self { config, wildcard: None }
    }

    pub fn evaluator(&self, void_suit: Option<Suit>) -> HandEvaluator {
        self.config.evaluator(self.wildcard, void_suit)
    }
}

/// 每局的计数器
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCounters {
    /// 本局杠数
    pub kong_count: u8,
    /// 圈数（跨局保留）
    pub circle_count: u32,
    /// 财神
    pub wildcard: Option<Tile>,
    /// 亮牌
    pub shown_tile: Option<Tile>,
    /// 牌墙最少保留张数
    pub least_remaining: usize,
}

/// 玩法实例：配置在一局内不变，计数器在每局开始时由 `restart` 重置
#[derive(Debug, Clone)]
pub struct Ruleset {
    config: RulesetConfig,
    counters: RoundCounters,
}

impl Ruleset {
    pub fn new(config: RulesetConfig) -> Self {
        let counters = RoundCounters {
            least_remaining: config.reserve_tiles,
            ..RoundCounters::default()
        };
        Self { config, counters }
    }

    pub fn config(&self) -> &RulesetConfig {
        &self.config
    }

    pub fn counters(&self) -> &RoundCounters {
        &self.counters
    }

    /// 开始新的一局：重置杠数、财神和亮牌，圈数保留
    pub fn restart(&mut self) {
        self.counters = RoundCounters {
            circle_count: self.counters.circle_count,
            least_remaining: self.config.reserve_tiles,
            ..RoundCounters::default()
        };
        debug!(ruleset = %self.config.kind, circle = self.counters.circle_count, "ruleset restarted");
    }

    /// 记录亮牌，并按规则推导财神
    pub fn set_shown_tile(&mut self, tile: Tile) {
        self.counters.shown_tile = Some(tile);
        self.counters.wildcard = match self.config.wildcard_rule {
            WildcardRule::None => None,
            WildcardRule::NextOfShown => Some(tile.next_in_cycle()),
        };
    }

    /// 亮牌被摸走（杠后补牌）
    pub fn clear_shown_tile(&mut self) {
        self.counters.shown_tile = None;
    }

    pub fn wildcard(&self) -> Option<Tile> {
        self.counters.wildcard
    }

    /// 记录一次杠，返回杠数是否已超过上限（这次杠的补牌是最后的机会）
    pub fn record_kong(&mut self) -> bool {
        self.counters.kong_count = self.counters.kong_count.saturating_add(1);
        self.kong_limit_exceeded()
    }

    pub fn kong_limit_exceeded(&self) -> bool {
        self.config
            .max_kongs
            .is_some_and(|max| self.counters.kong_count > max)
    }

    /// 本局规则快照
    pub fn round_rules(&self) -> RoundRules {
        RoundRules {
            config: self.config.clone(),
            wildcard: self.counters.wildcard,
        }
    }

    pub fn increment_circle(&mut self) -> u32 {
        self.counters.circle_count += 1;
        self.counters.circle_count
    }
}

/// 检查缺一门
///
/// # 返回
///
/// `true` 表示定缺门已打完（或没有定缺），`false` 表示手中还有定缺门的牌
pub fn check_missing_suit(hand: &Hand, declared_suit: Option<Suit>) -> bool {
    declared_suit.map_or(true, |suit| !hand.has_suit(suit))
}
