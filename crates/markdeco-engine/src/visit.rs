use crate::error::BackendError;
use crate::error::DecorateError;
use crate::host::Annotation;
use crate::host::DecorationKind;
use crate::host::ImageRef;
use crate::host::ImageRenderer;
use async_trait::async_trait;
use markdeco_core::Node;
use markdeco_core::NodeKind;
use markdeco_core::NodeTag;
use markdeco_core::Snapshot;
use markdeco_core::TextRange;
use std::cell::Cell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use tracing::debug;

/// Snapshot of a document's render generation. A pass captures one at start
/// and goes stale as soon as a newer pass bumps the shared cell, which is
/// checked after every suspension point. Edits only reschedule; the bump
/// happens when the rescheduled pass begins.
#[derive(Clone, Debug)]
pub struct GenerationGuard {
    cell: Rc<Cell<u64>>,
    captured: u64,
}

impl GenerationGuard {
    pub fn capture(cell: Rc<Cell<u64>>) -> Self {
        let captured = cell.get();
        Self { cell, captured }
    }

    pub fn is_stale(&self) -> bool {
        self.cell.get() != self.captured
    }
}

/// Context inherited from ancestors, computed once at descent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inherited {
    /// List-item nesting depth of this node; each enclosing item adds one.
    pub list_depth: u8,
    /// Set for descendants of an ordered list.
    pub in_ordered_list: bool,
    /// Set for descendants of a heading.
    pub heading_level: Option<u8>,
}

/// Everything one pass queued for finalize: per-kind decoration ranges in
/// traversal order, plus annotations for the reconciler.
#[derive(Debug, Default)]
pub struct PassOutput {
    pub decorations: Vec<(DecorationKind, TextRange)>,
    pub annotations: Vec<Annotation>,
}

/// What a decorator sees for one node: the absolute span, inherited
/// context, the source text, and sinks for ranges and annotations.
pub struct DecorateCx<'a> {
    snapshot: &'a Snapshot,
    renderer: &'a dyn ImageRenderer,
    output: &'a mut PassOutput,
    memo: &'a mut HashMap<(usize, usize), TextRange>,
    span: Range<usize>,
    inherited: Inherited,
}

impl DecorateCx<'_> {
    /// Absolute byte span of the current node.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn inherited(&self) -> Inherited {
        self.inherited
    }

    /// The node's source text. Empty when the span is stale.
    pub fn text(&self) -> &str {
        self.snapshot.text().get(self.span.clone()).unwrap_or("")
    }

    /// Offset pair → host range, memoized per pass so identical ranges are
    /// resolved once.
    pub fn resolve(&mut self, start: usize, end: usize) -> Result<TextRange, DecorateError> {
        if let Some(range) = self.memo.get(&(start, end)) {
            return Ok(*range);
        }
        let range = self
            .snapshot
            .range_at(start, end)
            .ok_or(DecorateError::RangeResolution {
                offset: end.max(start),
                len: self.snapshot.len(),
            })?;
        self.memo.insert((start, end), range);
        Ok(range)
    }

    /// Queues one decoration. A failed resolution skips just this step,
    /// logged; the decorator and the traversal continue.
    pub fn push(&mut self, kind: DecorationKind, offsets: Range<usize>) {
        match self.resolve(offsets.start, offsets.end) {
            Ok(range) => self.output.decorations.push((kind, range)),
            Err(error) => debug!(?kind, %error, "decoration step skipped"),
        }
    }

    /// Queues one inline image annotation.
    pub fn annotate(
        &mut self,
        offsets: Range<usize>,
        target: String,
        label: String,
        image: ImageRef,
        collapsed: bool,
    ) {
        match self.resolve(offsets.start, offsets.end) {
            Ok(range) => self.output.annotations.push(Annotation {
                range,
                target,
                label,
                image,
                collapsed,
            }),
            Err(error) => debug!(%error, "annotation skipped"),
        }
    }

    /// Asks the external backend for an image. May suspend.
    pub async fn render_image(&self, source: &str) -> Result<ImageRef, BackendError> {
        self.renderer.render(source).await
    }
}

/// One decoration strategy for one node kind.
#[async_trait(?Send)]
pub trait Decorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError>;
}

/// Node-kind → decorator strategy table.
#[derive(Default)]
pub struct DecoratorTable {
    map: HashMap<NodeTag, Box<dyn Decorator>>,
}

impl DecoratorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: NodeTag, decorator: Box<dyn Decorator>) {
        self.map.insert(tag, decorator);
    }

    pub fn get(&self, tag: NodeTag) -> Option<&dyn Decorator> {
        self.map.get(&tag).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Explicit-stack depth-first traversal over one parsed window.
pub struct TreeVisitor<'a> {
    pub table: &'a DecoratorTable,
    pub snapshot: &'a Snapshot,
    pub renderer: &'a dyn ImageRenderer,
    pub guard: GenerationGuard,
}

impl TreeVisitor<'_> {
    /// Visits `tree` (parsed from a window with `base` and a synthetic
    /// prefix of `prefix_len` bytes), dispatching registered decorators in
    /// source order and awaiting each in turn. Returns `false` when the
    /// pass went stale mid-traversal.
    ///
    /// Decorator failures are logged and isolated: no node aborts the walk.
    pub async fn visit(
        &self,
        tree: &Node,
        base: usize,
        prefix_len: usize,
        output: &mut PassOutput,
        memo: &mut HashMap<(usize, usize), TextRange>,
    ) -> bool {
        // normalize guarantees base >= prefix_len before applying a prefix
        let effective_base = base - prefix_len;
        let mut stack: Vec<(&Node, Inherited)> = vec![(tree, Inherited::default())];
        while let Some((node, inherited)) = stack.pop() {
            if prefix_len > 0 && node.span.end <= prefix_len {
                // wholly inside the synthetic prefix
                continue;
            }
            if let Some(decorator) = self.table.get(node.tag()) {
                let start = effective_base + node.span.start.max(prefix_len);
                let end = effective_base + node.span.end;
                let mut cx = DecorateCx {
                    snapshot: self.snapshot,
                    renderer: self.renderer,
                    output: &mut *output,
                    memo: &mut *memo,
                    span: start..end,
                    inherited,
                };
                if let Err(error) = decorator.decorate(&mut cx, node).await {
                    debug!(tag = ?node.tag(), %error, "decorator skipped node");
                }
                if self.guard.is_stale() {
                    return false;
                }
            }
            let mut child_inherited = inherited;
            match &node.kind {
                NodeKind::List { ordered } => child_inherited.in_ordered_list = *ordered,
                NodeKind::Item { .. } => child_inherited.list_depth += 1,
                NodeKind::Heading { level } => child_inherited.heading_level = Some(*level),
                _ => {}
            }
            for child in node.children.iter().rev() {
                stack.push((child, child_inherited));
            }
        }
        true
    }
}
