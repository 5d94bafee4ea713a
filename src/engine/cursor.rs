//! Crawl position across the configured sources.

use std::fmt;

/// Where the crawler is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    /// `page` pages of source `index` have been visited so far.
    AtSource { index: usize, page: u32 },
    /// Every source has been walked to its last page.
    Exhausted,
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorPosition::AtSource { index, page } => write!(f, "source #{index}, page {page}"),
            CursorPosition::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// State machine driving which page is fetched next.
///
/// `pinned_handled` flips to true once per traversal, after the pinned
/// giveaways (shown on every page) have been evaluated.
#[derive(Debug, Clone)]
pub struct CrawlCursor {
    source_count: usize,
    position: CursorPosition,
    pinned_handled: bool,
}

impl CrawlCursor {
    pub fn new(source_count: usize) -> Self {
        Self {
            source_count,
            position: Self::start(source_count),
            pinned_handled: false,
        }
    }

    fn start(source_count: usize) -> CursorPosition {
        if source_count == 0 {
            CursorPosition::Exhausted
        } else {
            CursorPosition::AtSource { index: 0, page: 0 }
        }
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// Current `(source index, pages visited)`, unless exhausted.
    pub fn current(&self) -> Option<(usize, u32)> {
        match self.position {
            CursorPosition::AtSource { index, page } => Some((index, page)),
            CursorPosition::Exhausted => None,
        }
    }

    /// 1-based number of the page to fetch next.
    pub fn next_page_number(&self) -> Option<u32> {
        self.current().map(|(_, page)| page + 1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position == CursorPosition::Exhausted
    }

    pub fn pinned_handled(&self) -> bool {
        self.pinned_handled
    }

    pub fn mark_pinned_handled(&mut self) {
        self.pinned_handled = true;
    }

    /// Move past the page just processed.
    pub fn advance(&mut self, is_last_page: bool) {
        self.position = match self.position {
            CursorPosition::AtSource { index, page } if !is_last_page => CursorPosition::AtSource {
                index,
                page: page + 1,
            },
            CursorPosition::AtSource { index, .. } if index + 1 < self.source_count => {
                CursorPosition::AtSource {
                    index: index + 1,
                    page: 0,
                }
            }
            _ => CursorPosition::Exhausted,
        };
    }

    /// Back to the first page of the first source, pinned items unhandled.
    pub fn reset(&mut self) {
        self.position = Self::start(self.source_count);
        self.pinned_handled = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
