//! Pagination envelope shared by contact and activity listings.

use serde::Serialize;

/// Upper bound on `limit` for any listing.
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page:  u32,
  pub total_pages:   u64,
  pub total:         u64,
  pub limit:         u32,
  pub has_next_page: bool,
  pub has_prev_page: bool,
}

impl Pagination {
  pub fn new(page: u32, limit: u32, total: u64) -> Self {
    let total_pages = if limit == 0 { 0 } else { total.div_ceil(u64::from(limit)) };
    Self {
      current_page: page,
      total_pages,
      total,
      limit,
      has_next_page: u64::from(page) < total_pages,
      has_prev_page: page > 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub items:      Vec<T>,
  pub pagination: Pagination,
}

/// Clamp a client-supplied `(page, limit)` pair: page is at least 1 and limit
/// lies in `1..=MAX_LIMIT`.
pub fn clamp(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> (u32, u32) {
  let page = page.unwrap_or(1).max(1);
  let limit = limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
  (page, limit)
}

/// Row offset of the first item on `page`.
pub fn offset(page: u32, limit: u32) -> u64 {
  u64::from(page.saturating_sub(1)) * u64::from(limit)
}
