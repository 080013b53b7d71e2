use std::ops::Range;

/// A zero-based line/column location. `column` counts bytes within the line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A resolved half-open position range. Produced from byte offsets through
/// [`Snapshot::range_at`]; this is what gets handed to the editor host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn intersects(&self, other: &TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// An immutable text snapshot with a precomputed line-start table.
///
/// All offsets are byte offsets into `text`. Translation is fallible by
/// design: a stale offset (taken before a concurrent edit) yields `None`
/// rather than panicking, and the caller skips that decoration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    text: String,
    line_starts: Vec<usize>,
}

impl Snapshot {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines, counting the (possibly empty) line after a trailing
    /// newline.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte span of `line` including its terminator.
    pub fn line_span(&self, line: usize) -> Option<Range<usize>> {
        let start = self.line_start(line)?;
        let end = self
            .line_start(line + 1)
            .unwrap_or(self.text.len());
        Some(start..end)
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        let span = self.line_span(line)?;
        Some(self.text[span].trim_end_matches(['\n', '\r']))
    }

    /// Line index containing `offset`. Offsets at the very end of the text
    /// belong to the last line.
    pub fn line_of_offset(&self, offset: usize) -> Option<usize> {
        if offset > self.text.len() {
            return None;
        }
        Some(match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        })
    }

    pub fn position_at(&self, offset: usize) -> Option<Position> {
        let line = self.line_of_offset(offset)?;
        let column = offset - self.line_starts[line];
        Some(Position::new(line as u32, column as u32))
    }

    pub fn offset_at(&self, pos: Position) -> Option<usize> {
        let span = self.line_span(pos.line as usize)?;
        let offset = span.start + pos.column as usize;
        (offset <= span.end).then_some(offset)
    }

    /// Resolves a byte-offset pair into a host-facing range.
    pub fn range_at(&self, start: usize, end: usize) -> Option<TextRange> {
        if start > end {
            return None;
        }
        Some(TextRange::new(
            self.position_at(start)?,
            self.position_at(end)?,
        ))
    }

    /// The full-line range containing `offset`, used for clear-under-cursor.
    pub fn line_range_of(&self, offset: usize) -> Option<TextRange> {
        let line = self.line_of_offset(offset)?;
        let span = self.line_span(line)?;
        self.range_at(span.start, span.end)
    }
}
