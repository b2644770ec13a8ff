//! Shared types for the HTTP API layer.

use std::sync::Arc;

use crate::core_state::CoreState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Authenticated staff member, injected into request extensions by the
/// auth middleware after successful token validation.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub username: String,
}
