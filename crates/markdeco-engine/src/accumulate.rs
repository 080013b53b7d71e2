use crate::host::DecorationKind;
use crate::host::EditorHost;
use markdeco_core::TextRange;
use std::collections::HashMap;
use url::Url;

/// Cursor-reveal filtering applied when a pass finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearOptions {
    /// Drop ranges intersecting the raw selection.
    pub under_cursor: bool,
    /// Drop ranges intersecting the cursor's whole line.
    pub under_cursor_line: bool,
}

/// Per-document decoration-kind → range-list map.
///
/// Keys survive between passes (the Vec is cleared, not the entry) so a kind
/// used on every render never re-allocates its slot; a kind that ends a pass
/// empty is dropped and redeclared on next use.
#[derive(Debug, Default)]
pub struct DecorationMap {
    kinds: HashMap<DecorationKind, Vec<TextRange>>,
}

impl DecorationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self) {
        for ranges in self.kinds.values_mut() {
            ranges.clear();
        }
    }

    pub fn push(&mut self, kind: DecorationKind, range: TextRange) {
        self.kinds.entry(kind).or_default().push(range);
    }

    pub fn ranges(&self, kind: DecorationKind) -> &[TextRange] {
        self.kinds.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn range_count(&self) -> usize {
        self.kinds.values().map(Vec::len).sum()
    }

    /// Applies every kind's batch to the host, after cursor filtering, then
    /// drops kinds that ended up empty. The empty batch is still applied so
    /// the host clears stale ranges of that kind.
    pub fn finish(
        &mut self,
        host: &mut dyn EditorHost,
        uri: &Url,
        options: ClearOptions,
        selection: Option<TextRange>,
        cursor_line: Option<TextRange>,
    ) {
        for (kind, ranges) in &mut self.kinds {
            if options.under_cursor_line {
                if let Some(line) = cursor_line {
                    ranges.retain(|r| !r.intersects(&line));
                }
            }
            if options.under_cursor {
                if let Some(sel) = selection {
                    ranges.retain(|r| !r.intersects(&sel));
                }
            }
            host.apply_decorations(uri, *kind, ranges);
        }
        self.kinds.retain(|_, ranges| !ranges.is_empty());
    }
}
