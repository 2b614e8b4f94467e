pub mod action_mask;

pub use action_mask::{ActionMask, PendingActions};
