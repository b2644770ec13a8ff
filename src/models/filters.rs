use serde::Deserialize;
use uuid::Uuid;

use super::enums::FollowUpStatus;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Offset pagination shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Limit clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Default)]
pub struct FollowUpFilter {
    pub status: Option<FollowUpStatus>,
    pub patient_id: Option<Uuid>,
    pub page: Page,
}
