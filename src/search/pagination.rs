//! Pagination contract / 分页约定
//!
//! Pages are 1-indexed with a fixed size of 50. Out-of-range pages are empty,
//! never an error.

use serde::Serialize;

/// Results per page / 每页结果数
pub const PAGE_SIZE: usize = 50;

/// Numbered buttons shown in the page selector / 页码按钮数量
pub const MAX_PAGES_TO_SHOW: usize = 7;

/// `ceil(total / PAGE_SIZE)` / 总页数
pub fn total_pages(total: u64) -> u64 {
    total.div_ceil(PAGE_SIZE as u64)
}

/// Row offset of a page; page 0 is treated as page 1 / 页偏移
pub fn offset(page: u32) -> usize {
    (page.max(1) as usize - 1) * PAGE_SIZE
}

/// Clamp a page into `[1, total_pages]` / 限定页码范围
pub fn clamp_page(page: u32, total: u64) -> u32 {
    let last = total_pages(total).clamp(1, u32::MAX as u64) as u32;
    page.clamp(1, last)
}

/// Cut one page out of the ordered list / 截取一页
pub fn window<T>(items: Vec<T>, page: u32) -> Vec<T> {
    items.into_iter().skip(offset(page)).take(PAGE_SIZE).collect()
}

/// One entry of the page selector / 分页器条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageLink {
    /// « jump to first / 首页
    First { page: u32, disabled: bool },
    Page { page: u32, active: bool },
    Ellipsis,
    /// » jump to last / 末页
    Last { page: u32, disabled: bool },
}

/// Build the page selector for `current` out of `total_pages` / 生成分页器
///
/// Empty when there is at most one page.
pub fn page_links(current: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let span = MAX_PAGES_TO_SHOW as u32;

    let mut start = current.saturating_sub(span / 2).max(1);
    let end = (start + span - 1).min(total_pages);
    if end - start + 1 < span {
        start = (end + 1).saturating_sub(span).max(1);
    }

    let mut links = vec![PageLink::First { page: 1, disabled: current == 1 }];

    if start > 1 {
        links.push(PageLink::Page { page: 1, active: false });
        if start > 2 {
            links.push(PageLink::Ellipsis);
        }
    }

    for page in start..=end {
        links.push(PageLink::Page { page, active: page == current });
    }

    if end < total_pages {
        if end < total_pages - 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page { page: total_pages, active: false });
    }

    links.push(PageLink::Last { page: total_pages, disabled: current == total_pages });
    links
}
