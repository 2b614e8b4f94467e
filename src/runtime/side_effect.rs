use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::game::state::ActionNotice;

/// 副作用执行失败（音效缺失等），只记录日志
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("side effect for `{action}` failed: {reason}")]
pub struct SideEffectError {
    pub action: &'static str,
    pub reason: String,
}

/// 动作完成后的副作用（音效、动画……）
///
/// 在独立队列上执行，失败不影响牌局
pub trait SideEffectSink: Send + 'static {
    fn notify(&mut self, notice: &ActionNotice) -> Result<(), SideEffectError>;
}

/// 只写日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl SideEffectSink for LoggingSink {
    fn notify(&mut self, notice: &ActionNotice) -> Result<(), SideEffectError> {
        info!(seat = notice.seat, action = notice.action, tile = ?notice.tile, "action completed");
        Ok(())
    }
}

/// 转发到通道
pub struct ChannelSink {
    notices: UnboundedSender<ActionNotice>,
}

impl ChannelSink {
    pub fn new(notices: UnboundedSender<ActionNotice>) -> Self {
        Self { notices }
    }
}

impl SideEffectSink for ChannelSink {
    fn notify(&mut self, notice: &ActionNotice) -> Result<(), SideEffectError> {
        self.notices.send(notice.clone()).map_err(|_| SideEffectError {
            action: notice.action,
            reason: "receiver closed".to_string(),
        })
    }
}

/// 启动副作用队列，发送端全部关闭后结束
pub fn spawn_side_effects<S: SideEffectSink>(mut sink: S, mut notices: UnboundedReceiver<ActionNotice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            if let Err(err) = sink.notify(&notice) {
                warn!(seat = notice.seat, error = %err, "side effect dropped");
            }
        }
        debug!("side-effect queue closed");
    })
}
