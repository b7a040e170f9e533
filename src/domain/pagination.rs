//! Pagination domain logic centralization.
//!
//! Responsibility:
//! - 요청 페이지 번호 -> fetch 파라미터(offset/limit) 변환
//! - 범위 검사 (범위 밖 페이지는 fetch 자체를 발행하지 않음)
//! - 화면 표시용 전체 페이지 수 / 이전·다음 페이지 계산
//!
//! Pure functions only; no side effects.

use serde::{Deserialize, Serialize};

use crate::domain::errors::SyncError;

/// Fixed page size used by the catalog view
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Fetch parameters derived from a validated page index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u32,
    pub offset: u32,
    pub limit: u32,
}

/// Highest page index that may be requested for `total_count` items.
///
/// A page is addressable while its offset does not exceed the total, so a total that
/// is an exact multiple of the page size leaves one trailing empty page
/// (650 items / 50 per page -> page 14 at offset 650).
#[must_use]
pub const fn max_page(page_size: u32, total_count: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    total_count / page_size + 1
}

/// Maps a requested page to `{offset, page}`.
///
/// `requested` below 1 or beyond [`max_page`] is rejected; the caller must not
/// issue a fetch in that case.
pub fn derive_page(requested: u32, page_size: u32, total_count: u32) -> Result<PageRequest, SyncError> {
    let upper = max_page(page_size, total_count);
    if requested < 1 || requested > upper || page_size == 0 {
        return Err(SyncError::OutOfRange {
            requested,
            max_page: upper,
        });
    }
    Ok(PageRequest {
        page: requested,
        offset: (requested - 1) * page_size,
        limit: page_size,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Paginator {
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self { page_size }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Bounds-checked derivation. `total_count` is `None` until the list endpoint has
    /// answered once; only the lower bound applies then.
    pub fn derive(&self, requested: u32, total_count: Option<u32>) -> Result<PageRequest, SyncError> {
        match total_count {
            Some(total) => derive_page(requested, self.page_size, total),
            None if requested >= 1 && self.page_size > 0 => Ok(PageRequest {
                page: requested,
                offset: (requested - 1).saturating_mul(self.page_size),
                limit: self.page_size,
            }),
            None => Err(SyncError::OutOfRange {
                requested,
                max_page: 1,
            }),
        }
    }

    /// "Page x of y" denominator: pages that actually hold items.
    #[must_use]
    pub const fn total_pages(&self, total_count: u32) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        total_count.div_ceil(self.page_size)
    }

    pub fn next(&self, current: u32, total_count: u32) -> Result<PageRequest, SyncError> {
        derive_page(current.saturating_add(1), self.page_size, total_count)
    }

    pub fn previous(&self, current: u32, total_count: u32) -> Result<PageRequest, SyncError> {
        derive_page(current.saturating_sub(1), self.page_size, total_count)
    }

    /// Number of items the list endpoint should return for `request`
    #[must_use]
    pub const fn expected_len(&self, request: &PageRequest, total_count: u32) -> u32 {
        let remaining = total_count.saturating_sub(request.offset);
        if remaining < request.limit { remaining } else { request.limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_basic_mapping() {
        let req = derive_page(1, 50, 1302).unwrap();
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, 50);

        let req = derive_page(3, 50, 1302).unwrap();
        assert_eq!(req.offset, 100);
        assert_eq!(req.page, 3);
    }

    #[test]
    fn test_trailing_empty_page_is_addressable() {
        // 650 / 50: page 14 starts exactly at the end
        let req = derive_page(14, 50, 650).unwrap();
        assert_eq!(req.offset, 650);
        assert_eq!(Paginator::new(50).expected_len(&req, 650), 0);

        let err = derive_page(15, 50, 650).unwrap_err();
        assert_eq!(
            err,
            SyncError::OutOfRange {
                requested: 15,
                max_page: 14
            }
        );
    }

    #[rstest]
    #[case(0, 1302)]
    #[case(28, 1302)]
    #[case(2, 0)]
    fn test_out_of_range(#[case] requested: u32, #[case] total: u32) {
        assert!(matches!(
            derive_page(requested, 50, total),
            Err(SyncError::OutOfRange { .. })
        ));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(50, 1)]
    #[case(51, 2)]
    #[case(650, 13)]
    #[case(1302, 27)]
    fn test_total_pages(#[case] total: u32, #[case] expected: u32) {
        assert_eq!(Paginator::default().total_pages(total), expected);
    }

    #[test]
    fn test_navigation_neighbours() {
        let paginator = Paginator::default();
        assert_eq!(paginator.next(1, 1302).unwrap().page, 2);
        assert!(paginator.previous(1, 1302).is_err());
        assert_eq!(paginator.previous(27, 1302).unwrap().offset, 1250);
        assert!(paginator.next(27, 1302).is_err());
    }

    #[test]
    fn test_unknown_total_only_checks_lower_bound() {
        let paginator = Paginator::default();
        assert_eq!(paginator.derive(7, None).unwrap().offset, 300);
        assert!(paginator.derive(0, None).is_err());
    }

    proptest! {
        #[test]
        fn valid_pages_have_offset_within_total(total in 0u32..100_000, size in 1u32..200, page in 1u32..3_000) {
            match derive_page(page, size, total) {
                Ok(req) => {
                    prop_assert_eq!(req.offset, (page - 1) * size);
                    prop_assert!(req.offset <= total);
                    let expected = Paginator::new(size).expected_len(&req, total);
                    prop_assert_eq!(expected, size.min(total - req.offset));
                }
                Err(SyncError::OutOfRange { max_page, .. }) => {
                    prop_assert!(page > max_page);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
