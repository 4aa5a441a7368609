//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Computes the page metadata and the item range to return.
    ///
    /// Operates on the clamped values, so hostile `page`/`per_page`
    /// inputs cannot overflow the offset or divide by zero.
    #[must_use]
    pub fn paginate(&self, total: usize) -> (PaginationMeta, usize, usize) {
        let Self { page, per_page } = self.clamped();
        let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);
        let total_pages = if total_u32 == 0 {
            0
        } else {
            total_u32.div_ceil(per_page)
        };
        let offset = u64::from(page - 1).saturating_mul(u64::from(per_page));
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        (
            PaginationMeta {
                page,
                per_page,
                total: total_u32,
                total_pages,
            },
            start,
            per_page as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, per_page: u32) -> PaginationParams {
        PaginationParams { page, per_page }
    }

    #[test]
    fn paginate_first_page() {
        let (meta, start, take) = params(1, 20).paginate(45);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(start, 0);
        assert_eq!(take, 20);
    }

    #[test]
    fn paginate_huge_page_does_not_overflow() {
        let (meta, start, take) = params(u32::MAX, 100).paginate(5);
        assert_eq!(meta.page, u32::MAX);
        assert_eq!(meta.total, 5);
        assert!(start >= 5);
        assert_eq!(take, 100);
    }

    #[test]
    fn paginate_clamps_zero_inputs() {
        let (meta, start, take) = params(0, 0).paginate(10);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.per_page, 1);
        assert_eq!(meta.total_pages, 10);
        assert_eq!(start, 0);
        assert_eq!(take, 1);
    }
}
