//! Overlapping line-window chunker.
//!
//! Splits a document's lines into [`Window`]s. A window starts at every
//! multiple `i` of `stride` below the line count and spans
//! `[max(0, i - left_pad), min(len, i + reach)]`, so consecutive windows
//! share context at their boundaries. With the defaults (200/50/250) each
//! window is at most 300 lines long.
//!
//! Iteration stops after the first window that reaches the end of the
//! document: any later window would lie entirely inside it. A document of
//! at most `reach` lines is therefore always exactly one window. The same
//! rule applies at every length, so a document whose last stride start falls
//! inside the previous window (with the defaults, 401..=450, 601..=650 lines
//! and so on) gets one window fewer than a plain "one window per stride"
//! loop. Coverage is the same either way.
//!
//! The iterator is lazy and borrows the line slice; no state survives
//! between documents.

use crate::config::ChunkingConfig;
use crate::models::Window;

/// Iterator over the windows of one document.
pub struct Windows<'a, S> {
    lines: &'a [S],
    params: ChunkingConfig,
    next: usize,
    done: bool,
}

impl<'a, S: AsRef<str>> Iterator for Windows<'a, S> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let i = self.next;
        if self.done || i >= self.lines.len() {
            return None;
        }
        self.next = i.saturating_add(self.params.stride.max(1));

        let start = i.saturating_sub(self.params.left_pad);
        let end = self.lines.len().min(i.saturating_add(self.params.reach));
        self.done = end == self.lines.len();
        let text = self.lines[start..end]
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<_>>()
            .join("\n");

        Some(Window { start, end, text })
    }
}

/// Produce the windows of `lines` using `params`.
pub fn windows<S: AsRef<str>>(lines: &[S], params: ChunkingConfig) -> Windows<'_, S> {
    Windows {
        lines,
        params,
        next: 0,
        done: false,
    }
}

/// Split document content into the line sequence the chunker works on.
///
/// Splits on `\n` only, so a trailing newline yields a final empty line and
/// an empty document is a single empty line.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}
