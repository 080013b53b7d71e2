use markdeco_core::Snapshot;
use std::ops::Range;

/// Documents at or under this many lines are handled in one whole-document
/// pass.
pub const WHOLE_DOCUMENT_LINE_LIMIT: usize = 450;

/// Lines of margin added to each side of a visible range, so scrolling does
/// not flicker at the window edges.
pub const WINDOW_MARGIN_LINES: usize = 60;

/// One slice of parse/decorate work: a byte span of the document plus the
/// offset base that translates slice-local offsets back to absolute ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub lines: Range<usize>,
    pub offsets: Range<usize>,
    pub base: usize,
}

/// Partitions a render pass into windows.
///
/// Small documents get a single window with base 0. Large ones get one
/// window per visible line range, expanded by [`WINDOW_MARGIN_LINES`] on
/// both sides and clamped to the document. Split views hand in several
/// visible ranges; each is processed independently and their decorations
/// accumulate without conflict.
pub fn windows_for(snapshot: &Snapshot, visible: &[Range<usize>]) -> Vec<Window> {
    let line_count = snapshot.line_count();
    if line_count <= WHOLE_DOCUMENT_LINE_LIMIT {
        return vec![Window {
            lines: 0..line_count,
            offsets: 0..snapshot.len(),
            base: 0,
        }];
    }
    visible
        .iter()
        .filter_map(|range| {
            let start_line = range.start.saturating_sub(WINDOW_MARGIN_LINES);
            let end_line = range.end.saturating_add(WINDOW_MARGIN_LINES).min(line_count);
            if start_line >= end_line {
                return None;
            }
            let start = snapshot.line_start(start_line)?;
            let end = match snapshot.line_start(end_line) {
                Some(offset) => offset,
                None => snapshot.len(),
            };
            Some(Window {
                lines: start_line..end_line,
                offsets: start..end,
                base: start,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Snapshot {
        let mut text = String::new();
        for i in 0..n {
            text.push_str(&format!("line {i}\n"));
        }
        Snapshot::new(text)
    }

    #[test]
    fn small_documents_use_one_whole_window() {
        let snapshot = lines(10);
        let windows = windows_for(&snapshot, &[2..5]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].base, 0);
        assert_eq!(windows[0].offsets, 0..snapshot.len());
    }

    #[test]
    fn large_documents_expand_visible_ranges_by_margin() {
        let snapshot = lines(1000);
        let windows = windows_for(&snapshot, &[500..520]);
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.lines, 500 - WINDOW_MARGIN_LINES..520 + WINDOW_MARGIN_LINES);
        assert_eq!(w.base, snapshot.line_start(w.lines.start).unwrap());
    }

    #[test]
    fn margin_clamps_to_document_bounds() {
        let snapshot = lines(1000);
        let windows = windows_for(&snapshot, &[0..10, 995..1000]);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].lines.start, 0);
        assert!(windows[1].lines.end <= snapshot.line_count());
        assert_eq!(windows[1].offsets.end, snapshot.len());
    }

    #[test]
    fn split_views_produce_independent_windows() {
        let snapshot = lines(2000);
        let windows = windows_for(&snapshot, &[100..120, 1500..1520]);
        assert_eq!(windows.len(), 2);
        assert!(windows[0].offsets.end <= windows[1].offsets.start);
    }
}
