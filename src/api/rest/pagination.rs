use serde::Serialize;

use crate::store::PageRequest;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// The store encodes skip as a signed 64-bit integer.
const MAX_SKIP: u64 = i64::MAX as u64;

/// A resolved page position. Unparsable or out-of-range query values fall
/// back to defaults instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Self { page, limit }
    }

    pub fn first(limit: u64) -> Self {
        Self { page: 1, limit }
    }

    pub fn request(&self) -> PageRequest {
        PageRequest {
            skip: (self.page - 1).saturating_mul(self.limit).min(MAX_SKIP),
            limit: i64::try_from(self.limit).unwrap_or(i64::MAX),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        let total_pages = total.div_ceil(page.limit);

        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
            has_next: page.page < total_pages,
            has_prev: page.page > 1,
        }
    }
}
