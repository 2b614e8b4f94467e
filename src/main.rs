//! 可执行文件入口：四个脚本座位打一圈，输出每局结果

use std::process::ExitCode;

use majiang_engine::telemetry::init_tracing;
use majiang_engine::{EngineConfig, RoundOutcome, RoundRuntime, RulesetConfig};
use tracing::{error, info};

const DEMO_ROUNDS: u32 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("配置错误：{err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.json_logs);
    info!(ruleset = %config.ruleset, seed = ?config.seed, "majiang engine demo");

    let rules = RulesetConfig::for_kind(config.ruleset);
    let handle = RoundRuntime::new(config, rules, 0).spawn(DEMO_ROUNDS);
    match handle.join().await {
        Ok(summaries) => {
            for summary in &summaries {
                let winners: Vec<_> = match &summary.outcome {
                    RoundOutcome::Normal { wins } => wins.iter().map(|win| win.seat).collect(),
                    _ => Vec::new(),
                };
                info!(
                    round = summary.round,
                    outcome = ?summary.outcome,
                    ?winners,
                    discards = summary.record.discards.len(),
                    kongs = summary.record.kongs.len(),
                    next_banker = summary.banker.seat,
                    circle = summary.circle,
                    "round summary"
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session failed");
            ExitCode::FAILURE
        }
    }
}
