use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::rules::RulesetKind;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// 定缺等待超时后的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidTimeoutPolicy {
    /// 以 `EngineError::VoidSuitTimeout` 结束
    #[default]
    Fail,
    /// 自动选择张数最少的花色
    AutoDeclare,
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ruleset: RulesetKind,
    /// 洗牌种子（None 时使用线程随机数）
    pub seed: Option<u64>,
    pub void_suit_timeout_ms: u64,
    pub void_timeout_policy: VoidTimeoutPolicy,
    /// 同步握手的重试间隔
    pub sync_poll_interval_ms: u64,
    pub json_logs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ruleset: RulesetKind::Classic,
            seed: None,
            void_suit_timeout_ms: 30_000,
            void_timeout_policy: VoidTimeoutPolicy::Fail,
            sync_poll_interval_ms: 500,
            json_logs: false,
        }
    }
}

impl EngineConfig {
    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MJ_RULESET") {
            config.ruleset = value.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "MJ_RULESET",
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = lookup("MJ_SEED") {
            config.seed = Some(parse_number("MJ_SEED", &value)?);
        }
        if let Some(value) = lookup("MJ_VOID_TIMEOUT_MS") {
            config.void_suit_timeout_ms = parse_number("MJ_VOID_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("MJ_VOID_TIMEOUT_POLICY") {
            config.void_timeout_policy = match value.trim().to_ascii_lowercase().as_str() {
                "fail" => VoidTimeoutPolicy::Fail,
                "auto" | "auto_declare" => VoidTimeoutPolicy::AutoDeclare,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MJ_VOID_TIMEOUT_POLICY",
                        value,
                        reason: "expected `fail` or `auto_declare`".to_string(),
                    })
                }
            };
        }
        if let Some(value) = lookup("MJ_SYNC_POLL_MS") {
            config.sync_poll_interval_ms = parse_number("MJ_SYNC_POLL_MS", &value)?;
        }
        if let Some(value) = lookup("MJ_JSON_LOGS") {
            config.json_logs = matches!(value.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    pub fn void_suit_timeout(&self) -> Duration {
        Duration::from_millis(self.void_suit_timeout_ms)
    }

    /// 轮询间隔（至少 1 毫秒）
    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync_poll_interval_ms.max(1))
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
