//! Offset pagination for the programmable search service.
//!
//! The service returns at most 10 results per call and addresses pages with a
//! 1-based `start` offset, so a request for 25 results becomes three calls:
//!
//! ```text
//! start=1  num=10
//! start=11 num=10
//! start=21 num=5
//! ```
//!
//! A page that comes back empty or shorter than requested is the last one.

/// Largest `num` the service accepts per call.
pub const MAX_PAGE_SIZE: u32 = 10;

/// Largest total result count a caller may request.
pub const MAX_RESULTS: u32 = 30;

/// Clamps a requested result count into `1..=MAX_RESULTS`.
#[must_use]
pub fn clamp_result_count(num: u32) -> u32 {
    num.clamp(1, MAX_RESULTS)
}

/// One page request: 1-based `start` offset and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub size: u32,
}

impl PageWindow {
    /// Window for the zero-based `page` when `requested` results are wanted,
    /// or `None` once the earlier pages already cover the request.
    #[must_use]
    pub fn for_page(page: u32, requested: u32) -> Option<Self> {
        let offset = page.checked_mul(MAX_PAGE_SIZE)?;
        if offset >= requested {
            return None;
        }
        Some(Self {
            start: offset + 1,
            size: (requested - offset).min(MAX_PAGE_SIZE),
        })
    }

    /// Returns `true` if a page with `received` items ends pagination.
    #[must_use]
    pub fn is_last(self, received: usize) -> bool {
        received == 0 || received < self.size as usize
    }
}

/// Number of calls needed for `requested` results when every page is full.
#[must_use]
pub fn max_pages(requested: u32) -> u32 {
    requested.div_ceil(MAX_PAGE_SIZE)
}
