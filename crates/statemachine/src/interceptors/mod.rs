//! Transition executor interceptors
//!
//! Each interceptor wraps a delegate [`TransitionExecutor`], always calls it,
//! and forwards `force_remove_flow` unconditionally.
//!
//! [`TransitionExecutor`]: crate::executor::TransitionExecutor

mod checkpoint;
mod history;
mod trace;

pub use checkpoint::CheckpointVerifyingInterceptor;
pub use history::{HistoryInterceptor, TransitionRecord};
pub use trace::TracingInterceptor;
