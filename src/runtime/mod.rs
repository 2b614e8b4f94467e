//! 异步运行时
//!
//! 协调器、四个座位和副作用各占一个顺序队列，跨队列只传消息

pub mod session;
pub mod side_effect;
pub mod worker;

pub use session::{RoundRuntime, RuntimeHandle};
pub use side_effect::{ChannelSink, LoggingSink, SideEffectError, SideEffectSink};
pub use worker::{CoordinatorInput, SeatWorker, VoidGate};
