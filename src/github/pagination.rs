//! One "fetch the next page" abstraction over both REST link-header paging
//! and GraphQL cursor paging.

use crate::error::Result;
use async_trait::async_trait;

/// Largest page either API hands out.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

#[async_trait]
pub trait PageSource: Send {
    type Item: Send;

    /// Fetch the next page. `want` is how many more items the caller can
    /// use; sources that cannot size their pages may return more.
    async fn fetch_page(&mut self, want: usize) -> Result<Page<Self::Item>>;
}

/// Drain `source` until `max` items are collected or it runs dry. Never
/// returns more than `max` items, even when the last page overshoots.
pub async fn collect_up_to<S: PageSource>(source: &mut S, max: usize) -> Result<Vec<S::Item>> {
    let mut items = Vec::new();
    let mut pages = 0usize;
    while items.len() < max {
        let want = (max - items.len()).min(PAGE_SIZE);
        let page = source.fetch_page(want).await?;
        pages += 1;
        let empty = page.items.is_empty();
        items.extend(page.items);
        if !page.has_next || empty {
            break;
        }
    }
    items.truncate(max);
    tracing::debug!(pages, items = items.len(), max, "pagination finished");
    Ok(items)
}

/// URL of the `rel="next"` entry in a `Link` header.
pub fn next_link(link_header: &str) -> Option<&str> {
    link_header.split(',').find_map(|part| {
        let mut url = None;
        let mut is_next = false;
        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"').split_whitespace().any(|r| r == "next");
            }
        }
        if is_next {
            url
        } else {
            None
        }
    })
}

/// Drop scheme and host so the path can be replayed against the configured
/// API base.
pub fn path_and_query(url: &str) -> &str {
    match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
        }
        None => url,
    }
}
