use crate::window::Window;
use markdeco_core::Snapshot;
use std::borrow::Cow;

/// Indent width assumed per list level when the slice has no deeper nesting
/// to infer it from.
pub const DEFAULT_INDENT_STEP: usize = 2;

/// A windowed slice ready for parsing: possibly prefixed with synthetic
/// context, with the prefix length to subtract from every reported offset.
#[derive(Debug, PartialEq, Eq)]
pub struct Normalized<'a> {
    pub text: Cow<'a, str>,
    pub prefix_len: usize,
}

/// Pre-processes one window so the parser resolves constructs that start
/// before it.
///
/// A slice beginning inside a fenced code block is prefixed with a copy of
/// the unmatched opening fence line; a slice beginning mid-list gets one
/// synthetic list item per inferred nesting level. Either prefix is applied
/// only when the window's offset base is large enough to subtract it
/// without going negative.
pub fn normalize_window<'a>(snapshot: &'a Snapshot, window: &Window) -> Normalized<'a> {
    let slice = &snapshot.text()[window.offsets.clone()];
    if window.base == 0 {
        return Normalized {
            text: Cow::Borrowed(slice),
            prefix_len: 0,
        };
    }

    let prefix = match open_fence_before(snapshot.text(), window.base) {
        Some(fence_line) => Some(format!("{fence_line}\n")),
        None => list_prefix(slice),
    };
    match prefix {
        Some(prefix) if prefix.len() <= window.base => Normalized {
            prefix_len: prefix.len(),
            text: Cow::Owned(prefix + slice),
        },
        _ => Normalized {
            text: Cow::Borrowed(slice),
            prefix_len: 0,
        },
    }
}

/// The opening line of a code fence left unclosed before `until`, if any.
fn open_fence_before(text: &str, until: usize) -> Option<&str> {
    let mut open: Option<&str> = None;
    for line in text[..until].lines() {
        let line = line.trim_end();
        match open {
            None => {
                if fence_marker(line).is_some() {
                    open = Some(line);
                }
            }
            Some(opening) => {
                if closes_fence(opening, line) {
                    open = None;
                }
            }
        }
    }
    open
}

/// Fence character and run length of a fence line, ignoring up to three
/// leading spaces and any trailing info string.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|&c| c == first).count();
    (run >= 3).then_some((first, run))
}

fn closes_fence(opening: &str, line: &str) -> bool {
    let Some((open_char, open_run)) = fence_marker(opening) else {
        return false;
    };
    match fence_marker(line) {
        Some((c, run)) if c == open_char && run >= open_run => {
            line.trim().chars().all(|ch| ch == open_char)
        }
        _ => false,
    }
}

/// Synthesizes one bare list item per inferred nesting level, so a slice
/// that starts mid-list parses at the right depth.
fn list_prefix(slice: &str) -> Option<String> {
    let mut shallow: Option<usize> = None;
    let mut indents = Vec::new();
    for line in slice.lines() {
        if let Some(indent) = list_marker_indent(line) {
            indents.push(indent);
            if indent > 0 {
                shallow = Some(shallow.map_or(indent, |s| s.min(indent)));
            }
        }
    }
    let shallow = shallow?;
    let step = indents
        .iter()
        .filter(|&&i| i > shallow)
        .min()
        .map(|deeper| deeper - shallow)
        .unwrap_or(DEFAULT_INDENT_STEP);
    let levels = (shallow / step).max(1);
    let mut prefix = String::new();
    for level in 0..levels {
        for _ in 0..level * step {
            prefix.push(' ');
        }
        prefix.push_str("-\n");
    }
    Some(prefix)
}

/// Indent column of a list-marker line (`-`, `*`, `+` or `1.` / `1)`), tabs
/// counted as four columns.
fn list_marker_indent(line: &str) -> Option<usize> {
    let mut indent = 0;
    let mut rest = line;
    loop {
        if let Some(stripped) = rest.strip_prefix(' ') {
            indent += 1;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('\t') {
            indent += 4;
            rest = stripped;
        } else {
            break;
        }
    }
    let mut chars = rest.chars();
    match chars.next()? {
        '-' | '*' | '+' => {}
        c if c.is_ascii_digit() => {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            rest = &rest[digits..];
            let mut after = rest.chars();
            if !matches!(after.next(), Some('.') | Some(')')) {
                return None;
            }
            chars = after;
        }
        _ => return None,
    }
    match chars.next() {
        None | Some(' ') | Some('\t') => Some(indent),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::windows_for;
    use markdeco_core::parse_tree;
    use markdeco_core::NodeTag;

    fn window_at_line(snapshot: &Snapshot, line: usize) -> Window {
        let start = snapshot.line_start(line).unwrap();
        Window {
            lines: line..snapshot.line_count(),
            offsets: start..snapshot.len(),
            base: start,
        }
    }

    #[test]
    fn whole_document_window_is_untouched() {
        let snapshot = Snapshot::new("- a\n  - b\n");
        let windows = windows_for(&snapshot, &[0..2]);
        let normalized = normalize_window(&snapshot, &windows[0]);
        assert_eq!(normalized.prefix_len, 0);
        assert_eq!(normalized.text.as_ref(), snapshot.text());
    }

    #[test]
    fn mid_list_window_gets_one_item_per_level() {
        let snapshot = Snapshot::new("- a\n  - b\n    - c\n");
        let window = window_at_line(&snapshot, 2);
        let normalized = normalize_window(&snapshot, &window);
        assert_eq!(normalized.text.as_ref(), "-\n  -\n    - c\n");
        assert_eq!(normalized.prefix_len, 6);
    }

    #[test]
    fn prefix_subtraction_round_trips_offsets() {
        let snapshot = Snapshot::new("- a\n  - b\n    - c\n");
        let window = window_at_line(&snapshot, 2);
        let normalized = normalize_window(&snapshot, &window);
        let tree = parse_tree(&normalized.text);
        // Deepest text node is "c"; its absolute offset must land on the
        // original document's "c".
        let mut spans = Vec::new();
        collect_text_spans(&tree, &mut spans);
        let c_span = spans.last().unwrap().clone();
        let absolute = window.base - normalized.prefix_len + c_span.start;
        assert_eq!(&snapshot.text()[absolute..absolute + 1], "c");
    }

    fn collect_text_spans(node: &markdeco_core::Node, out: &mut Vec<std::ops::Range<usize>>) {
        if node.tag() == NodeTag::Text {
            out.push(node.span.clone());
        }
        for child in &node.children {
            collect_text_spans(child, out);
        }
    }

    #[test]
    fn indent_step_is_inferred_from_the_next_deeper_level() {
        let prefix = list_prefix("    - a\n        - b\n").unwrap();
        // Shallowest indent 4, next deeper 8 ⇒ step 4 ⇒ one level.
        assert_eq!(prefix, "-\n");
    }

    #[test]
    fn window_inside_a_fence_continues_the_fence() {
        let snapshot = Snapshot::new("```rust\nlet a = 1;\nlet b = 2;\n```\n");
        let window = window_at_line(&snapshot, 2);
        let normalized = normalize_window(&snapshot, &window);
        assert_eq!(normalized.prefix_len, "```rust\n".len());
        let tree = parse_tree(&normalized.text);
        assert!(tree.find(NodeTag::CodeBlock).is_some());
    }

    #[test]
    fn closed_fence_does_not_leak_into_later_windows() {
        let snapshot = Snapshot::new("```\ncode\n```\nplain paragraph\n");
        let window = window_at_line(&snapshot, 3);
        let normalized = normalize_window(&snapshot, &window);
        assert_eq!(normalized.prefix_len, 0);
    }

    #[test]
    fn oversized_prefix_is_not_applied() {
        let snapshot = Snapshot::new("x\n        - deep\n");
        let window = window_at_line(&snapshot, 1);
        let normalized = normalize_window(&snapshot, &window);
        // Four synthetic levels would outweigh the offset base of 2.
        assert_eq!(normalized.prefix_len, 0);
        assert_eq!(normalized.text.as_ref(), "        - deep\n");
    }
}
