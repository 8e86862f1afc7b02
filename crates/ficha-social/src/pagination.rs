//! Page arithmetic shared by every list endpoint.
//!
//! Handlers resolve the raw `?page=&limit=` query against [`PaginationSettings`], ask the
//! repository for one window of rows plus the total row count, and wrap the result in a
//! [`Page`] so clients always receive the same envelope.

use serde::{Deserialize, Serialize};

/// Limits applied when resolving a client query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Raw query parameters as sent by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationQuery {
    pub fn resolve(self, settings: PaginationSettings) -> Result<PageRequest, PaginationError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(PaginationError::PageOutOfRange);
        }

        let limit = match self.limit {
            Some(0) => return Err(PaginationError::LimitOutOfRange),
            Some(limit) => limit.min(settings.max_limit),
            None => settings.default_limit,
        };

        Ok(PageRequest { page, limit })
    }
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("page must be a positive integer")]
    PageOutOfRange,
    #[error("limit must be a positive integer")]
    LimitOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationEnvelope {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Builds the envelope for `total` rows. An empty result set yields zero pages rather than
/// an error.
pub fn paginate(total: u64, page: u32, limit: u32) -> PaginationEnvelope {
    let total_pages = total.div_ceil(u64::from(limit.max(1)));

    PaginationEnvelope {
        page,
        limit,
        total,
        total_pages,
        has_next: u64::from(page) < total_pages,
        has_prev: page > 1,
    }
}

/// Uniform list response body.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationEnvelope,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            success: true,
            data,
            pagination: paginate(total, request.page, request.limit),
        }
    }
}
