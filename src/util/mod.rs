//! Utility modules: caller-side retry, timeout.

pub mod retry;
pub mod timeout;
