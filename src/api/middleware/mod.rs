//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token lookup
//! 2. Audit logger: logs after auth, has the username

pub mod audit;
pub mod auth;
