//! Accumulated log buffer plus viewport state for the Logs view.
//!
//! The raw buffer only grows while a job is open. It is emptied in exactly
//! two places: entering the view for a job and an explicit manual refresh,
//! both of which go through [`LogView::reset`]. Every mutation re-derives the
//! rendered lines from `(raw, filter)`.

use crate::logs::{filter, render};
use ratatui::text::Line;

/// Rows taken by chrome around the log viewport: header (2), status line,
/// breadcrumb, footer (2). Must stay in sync with `tui::logs::render`.
const LOG_CHROME_ROWS: usize = 6;

/// Visible viewport height for a terminal of `height` rows.
pub fn viewport_height(height: u16, filter_bar: bool) -> usize {
    (height as usize)
        .saturating_sub(LOG_CHROME_ROWS + usize::from(filter_bar))
        .max(1)
}

#[derive(Debug, Clone)]
pub struct LogView {
    raw: String,
    rendered: Vec<Line<'static>>,
    pub scroll: usize,
    pub filter: String,
    pub filter_mode: bool,
    pub auto_scroll: bool,
    /// Set once any fetch has completed, even with no data. Distinguishes
    /// "Loading logs…" from "Waiting for logs…".
    pub loaded: bool,
    /// Guards the one-shot archive fetch after a running job completes.
    pub final_fetch_issued: bool,
    /// Bumped on every reset; results tagged with an older session are stale.
    pub session: u64,
    viewport: usize,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            raw: String::new(),
            rendered: Vec::new(),
            scroll: 0,
            filter: String::new(),
            filter_mode: false,
            auto_scroll: true,
            loaded: false,
            final_fetch_issued: false,
            session: 0,
            viewport: 20,
        }
    }
}

impl LogView {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn rendered(&self) -> &[Line<'static>] {
        &self.rendered
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Drop all content and start a new session. Auto-scroll is back on.
    pub fn reset(&mut self) {
        let session = self.session.wrapping_add(1);
        let viewport = self.viewport;
        *self = Self {
            session,
            viewport,
            ..Self::default()
        };
    }

    /// Append freshly fetched text. The caller supplies any separator.
    pub fn append(&mut self, text: &str) {
        self.loaded = true;
        if text.is_empty() {
            return;
        }
        self.raw.push_str(text);
        self.refresh();
    }

    /// Merge an authoritative full log. When it extends what we already hold
    /// only the suffix is appended; otherwise the archive replaces the buffer.
    pub fn reconcile(&mut self, full: &str) {
        self.loaded = true;
        if full.is_empty() {
            return;
        }
        if let Some(suffix) = full.strip_prefix(self.raw.as_str()) {
            if suffix.is_empty() {
                return;
            }
            self.raw.push_str(suffix);
        } else {
            self.raw = full.to_string();
        }
        self.refresh();
    }

    pub fn set_filter(&mut self, query: String) {
        self.filter = query;
        self.refresh();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.refresh();
    }

    pub fn pop_filter_char(&mut self) {
        if self.filter.pop().is_some() {
            self.refresh();
        }
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        if self.auto_scroll {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn max_scroll(&self) -> usize {
        self.rendered.len().saturating_sub(self.viewport)
    }

    pub fn scroll_up(&mut self, amount: usize) {
        if self.scroll > 0 {
            self.scroll = self.scroll.saturating_sub(amount);
            self.auto_scroll = false;
        }
    }

    /// Reaching the bottom re-enables auto-scroll.
    pub fn scroll_down(&mut self, amount: usize) {
        let max = self.max_scroll();
        self.scroll = (self.scroll + amount).min(max);
        if self.scroll >= max {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.auto_scroll = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.auto_scroll = true;
    }

    pub fn toggle_auto_scroll(&mut self) {
        self.auto_scroll = !self.auto_scroll;
        if self.auto_scroll {
            self.scroll = self.max_scroll();
        }
    }

    pub fn visible(&self) -> &[Line<'static>] {
        let start = self.scroll.min(self.rendered.len());
        let end = (start + self.viewport).min(self.rendered.len());
        &self.rendered[start..end]
    }

    fn refresh(&mut self) {
        self.rendered = if self.raw.is_empty() {
            Vec::new()
        } else {
            render::render(&filter::filter(&self.raw, &self.filter))
        };
        if self.auto_scroll {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(n: usize) -> String {
        (1..=n)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view_with(n: usize, viewport: usize) -> LogView {
        let mut v = LogView::default();
        v.set_viewport(viewport);
        v.append(&lines(n));
        v
    }

    #[test]
    fn append_accumulates() {
        let mut v = LogView::default();
        v.append("a");
        v.append("\nb");
        assert_eq!(v.raw(), "a\nb");
        assert_eq!(v.rendered().len(), 2);
    }

    #[test]
    fn empty_append_marks_loaded() {
        let mut v = LogView::default();
        v.append("");
        assert!(v.loaded);
        assert!(v.rendered().is_empty());
    }

    #[test]
    fn reset_clears_and_bumps_session() {
        let mut v = view_with(5, 2);
        v.scroll_to_top();
        v.set_filter("line".to_string());
        v.final_fetch_issued = true;
        let before = v.session;
        v.reset();
        assert_eq!(v.raw(), "");
        assert!(v.rendered().is_empty());
        assert!(v.auto_scroll);
        assert!(v.filter.is_empty());
        assert!(!v.final_fetch_issued);
        assert!(!v.loaded);
        assert_eq!(v.session, before + 1);
        assert_eq!(v.viewport(), 2);
    }

    #[test]
    fn auto_scroll_follows_appends() {
        let mut v = view_with(10, 4);
        assert_eq!(v.scroll, 6);
        v.append("\nline 11");
        assert_eq!(v.scroll, 7);
    }

    #[test]
    fn scroll_up_disables_auto_scroll() {
        let mut v = view_with(10, 4);
        v.scroll_up(1);
        assert!(!v.auto_scroll);
        assert_eq!(v.scroll, 5);
        v.append("\nline 11");
        assert_eq!(v.scroll, 5);
    }

    #[test]
    fn scroll_up_at_top_keeps_auto_scroll() {
        let mut v = view_with(2, 4);
        v.scroll_up(1);
        assert!(v.auto_scroll);
    }

    #[test]
    fn reaching_bottom_enables_auto_scroll() {
        let mut v = view_with(10, 4);
        v.scroll_to_top();
        assert!(!v.auto_scroll);
        v.scroll_down(100);
        assert_eq!(v.scroll, 6);
        assert!(v.auto_scroll);
    }

    #[test]
    fn toggle_auto_scroll_jumps_to_bottom() {
        let mut v = view_with(10, 4);
        v.scroll_to_top();
        v.toggle_auto_scroll();
        assert!(v.auto_scroll);
        assert_eq!(v.scroll, 6);
    }

    #[test]
    fn filter_rederives_from_raw() {
        let mut v = view_with(12, 50);
        v.set_filter("line 1".to_string());
        assert_eq!(v.rendered().len(), 4); // 1, 10, 11, 12
        v.pop_filter_char();
        v.pop_filter_char();
        assert_eq!(v.filter, "line");
        assert_eq!(v.rendered().len(), 12);
        assert_eq!(v.raw(), lines(12));
    }

    #[test]
    fn reconcile_appends_suffix_when_prefix_matches() {
        let mut v = LogView::default();
        v.append("a\nb");
        v.reconcile("a\nb\nc");
        assert_eq!(v.raw(), "a\nb\nc");
    }

    #[test]
    fn reconcile_replaces_divergent_buffer() {
        let mut v = LogView::default();
        v.append("step output only");
        v.reconcile("##[group]Run\nfull archive");
        assert_eq!(v.raw(), "##[group]Run\nfull archive");
    }

    #[test]
    fn reconcile_with_empty_keeps_buffer() {
        let mut v = LogView::default();
        v.append("kept");
        v.reconcile("");
        assert_eq!(v.raw(), "kept");
        assert!(v.loaded);
    }

    #[test]
    fn visible_window() {
        let mut v = view_with(10, 3);
        v.scroll_to_top();
        assert_eq!(v.visible().len(), 3);
        v.scroll_down(1);
        let first: String = v.visible()[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "line 2");
    }

    #[test]
    fn viewport_height_accounts_for_filter_bar() {
        assert_eq!(viewport_height(30, false), 24);
        assert_eq!(viewport_height(30, true), 23);
        assert_eq!(viewport_height(3, true), 1);
    }
}
