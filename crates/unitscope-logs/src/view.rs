use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::lines::LineAssembler;
use crate::pump::{DisplaySink, SinkError};

/// Default number of lines a view keeps
pub const DEFAULT_VIEW_CAPACITY: usize = 10_000;

struct ViewState {
    lines: VecDeque<String>,
    assembler: LineAssembler,
    title: String,
    follow: bool,
    revision: u64,
}

/// Thread-safe scrollback for one log pane.
///
/// The pump writes into one clone while the renderer reads from another.
/// Lines are stored with their color escapes, terminator stripped.
#[derive(Clone)]
pub struct LogView {
    state: Arc<RwLock<ViewState>>,

    /// Maximum lines retained
    capacity: usize,
}

impl LogView {
    /// Create a new view with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(ViewState {
                lines: VecDeque::with_capacity(capacity.min(DEFAULT_VIEW_CAPACITY)),
                assembler: LineAssembler::new(),
                title: String::new(),
                follow: true,
                revision: 0,
            })),
            capacity: capacity.max(1),
        }
    }

    /// All lines (cloned for rendering)
    pub fn lines(&self) -> Vec<String> {
        self.state.read().lines.iter().cloned().collect()
    }

    /// Last N lines
    pub fn tail(&self, n: usize) -> Vec<String> {
        let state = self.state.read();
        let start = state.lines.len().saturating_sub(n);
        state.lines.iter().skip(start).cloned().collect()
    }

    /// Lines in a range (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> Vec<String> {
        let state = self.state.read();
        state.lines.iter().skip(start).take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().lines.is_empty()
    }

    /// Bumped on every change; lets the renderer skip unchanged frames
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    /// Whether the pane should stick to the newest line
    pub fn follow(&self) -> bool {
        self.state.read().follow
    }

    pub fn set_follow(&self, follow: bool) {
        let mut state = self.state.write();
        if state.follow != follow {
            state.follow = follow;
            state.revision += 1;
        }
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_CAPACITY)
    }
}

impl DisplaySink for LogView {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut state = self.state.write();
        let lines = state.assembler.push(bytes);
        if lines.is_empty() {
            return Ok(());
        }

        for mut line in lines {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if state.lines.len() >= self.capacity {
                state.lines.pop_front();
            }
            state
                .lines
                .push_back(String::from_utf8_lossy(&line).into_owned());
        }
        state.revision += 1;
        Ok(())
    }

    fn clear(&mut self) {
        let mut state = self.state.write();
        state.lines.clear();
        state.assembler.clear();
        state.revision += 1;
    }

    fn scroll_to_end(&mut self) {
        self.set_follow(true);
    }

    fn set_title(&mut self, title: &str) {
        let mut state = self.state.write();
        state.title = title.to_string();
        state.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_splits_lines() {
        let mut view = LogView::new(10);
        view.write(b"one\ntwo\r\nthr").unwrap();
        assert_eq!(view.lines(), vec!["one", "two"]);

        view.write(b"ee\n").unwrap();
        assert_eq!(view.tail(1), vec!["three"]);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut view = LogView::new(3);
        for i in 0..5 {
            view.write(format!("line {}\n", i).as_bytes()).unwrap();
        }
        assert_eq!(view.lines(), vec!["line 2", "line 3", "line 4"]);
        assert_eq!(view.range(1, 5), vec!["line 3", "line 4"]);
    }

    #[test]
    fn test_clear_drops_partial_line() {
        let mut view = LogView::new(10);
        view.write(b"done\npartial").unwrap();
        view.clear();
        view.write(b"fresh\n").unwrap();
        assert_eq!(view.lines(), vec!["fresh"]);
    }

    #[test]
    fn test_clones_share_state() {
        let view = LogView::default();
        let mut writer = view.clone();
        let before = view.revision();

        writer.set_title("Kernel");
        writer.write(b"usb attached\n").unwrap();

        assert_eq!(view.title(), "Kernel");
        assert_eq!(view.len(), 1);
        assert!(view.revision() > before);
    }

    #[test]
    fn test_scroll_to_end_resumes_follow() {
        let mut view = LogView::default();
        view.set_follow(false);
        assert!(!view.follow());
        view.scroll_to_end();
        assert!(view.follow());
    }
}
