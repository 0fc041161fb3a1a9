//! Pagination math tests.

use ogc_common::page::{total_pages, PageInfo, PageParams};

// ============================================================================
// total_pages
// ============================================================================

#[test]
fn test_total_pages_exact_division() {
    assert_eq!(total_pages(200, 100), 2);
}

#[test]
fn test_total_pages_with_remainder() {
    assert_eq!(total_pages(250, 100), 3);
    assert_eq!(total_pages(101, 100), 2);
}

#[test]
fn test_total_pages_minimum_is_one() {
    assert_eq!(total_pages(0, 100), 1);
    assert_eq!(total_pages(1, 100), 1);
}

// ============================================================================
// PageInfo
// ============================================================================

#[test]
fn test_first_page_of_three() {
    let info = PageInfo::compute(PageParams::new(1, 100), 250, 100);
    assert_eq!(info.total_pages, 3);
    assert!(info.has_more);
    assert_eq!(info.start_index, 0);
    assert_eq!(info.end_index, 99);
}

#[test]
fn test_middle_page_indices() {
    let info = PageInfo::compute(PageParams::new(2, 100), 250, 100);
    assert_eq!(info.start_index, 100);
    assert_eq!(info.end_index, 199);
    assert!(info.has_more);
}

#[test]
fn test_last_page_has_no_more() {
    let info = PageInfo::compute(PageParams::new(3, 100), 250, 50);
    assert!(!info.has_more);
    assert_eq!(info.start_index, 200);
    assert_eq!(info.end_index, 249);
}

#[test]
fn test_unknown_total_still_yields_one_page() {
    // A failed count comes through as zero; pagination must stay sane.
    let info = PageInfo::compute(PageParams::new(1, 100), 0, 73);
    assert_eq!(info.total_pages, 1);
    assert!(!info.has_more);
    assert_eq!(info.end_index, 72);
}

#[test]
fn test_small_page_size() {
    let info = PageInfo::compute(PageParams::new(5, 25), 250, 25);
    assert_eq!(info.total_pages, 10);
    assert_eq!(info.start_index, 100);
    assert!(info.has_more);
}
