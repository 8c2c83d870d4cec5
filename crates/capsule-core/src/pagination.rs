//! Incremental reveal of a derived list.
//!
//! The window only tracks a count. It is keyed by the identity of the list it
//! was sized for: when the identity changes the count drops back to one page,
//! so a long previous list never leaks extra rows into a shorter new one.

use crate::view_state::ListIdentity;

/// What the grid should currently render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reveal<'a, T> {
    pub displayed: &'a [T],
    pub has_more: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum WindowState {
    #[default]
    Ready,
    Loading,
}

#[derive(Debug, Clone)]
pub struct PaginationWindow {
    page_size: usize,
    count: usize,
    total: usize,
    identity: Option<ListIdentity>,
    state: WindowState,
}

impl PaginationWindow {
    /// A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            count: page_size,
            total: 0,
            identity: None,
            state: WindowState::Ready,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Point the window at a list. A different identity resets it to one page.
    pub fn sync(&mut self, identity: ListIdentity, len: usize) {
        if self.identity != Some(identity) {
            tracing::debug!(?identity, len, "pagination reset for new list");
            self.identity = Some(identity);
            self.count = self.page_size;
            self.state = WindowState::Ready;
        }
        self.total = len;
    }

    /// Sync to `list` and return the visible prefix.
    pub fn reveal<'a, T>(&mut self, identity: ListIdentity, list: &'a [T]) -> Reveal<'a, T> {
        self.sync(identity, list.len());
        let shown = self.count.min(list.len());
        Reveal {
            displayed: &list[..shown],
            has_more: shown < list.len(),
        }
    }

    /// Number of items currently revealed.
    pub fn displayed_len(&self) -> usize {
        self.count.min(self.total)
    }

    pub fn has_more(&self) -> bool {
        self.count < self.total
    }

    pub fn is_loading(&self) -> bool {
        self.state == WindowState::Loading
    }

    /// Start revealing `n` more items.
    ///
    /// Enters the loading state and returns `true`; call
    /// [`finish_loading`](Self::finish_loading) once the rows are rendered.
    /// Does nothing while already loading or when nothing remains.
    pub fn begin_grow(&mut self, n: usize) -> bool {
        if self.is_loading() || !self.has_more() {
            return false;
        }
        self.state = WindowState::Loading;
        self.count = self.count.saturating_add(n).min(self.total);
        true
    }

    pub fn finish_loading(&mut self) {
        self.state = WindowState::Ready;
    }

    /// Grow and settle in one step.
    pub fn grow_by(&mut self, n: usize) -> bool {
        let grew = self.begin_grow(n);
        if grew {
            self.finish_loading();
        }
        grew
    }

    /// Grow by one page.
    pub fn next_page(&mut self) -> bool {
        self.grow_by(self.page_size)
    }
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_PAGE_SIZE)
    }
}
