use crate::accumulate::ClearOptions;
use crate::cache::DocumentCache;
use crate::cache::DocumentInput;
use crate::decorators;
use crate::host::EditorHost;
use crate::host::ImageRenderer;
use crate::normalize::normalize_window;
use crate::scheduler::RenderScheduler;
use crate::scheduler::DEFAULT_DEBOUNCE;
use crate::visit::DecoratorTable;
use crate::visit::GenerationGuard;
use crate::visit::PassOutput;
use crate::visit::TreeVisitor;
use crate::window::windows_for;
use crate::window::Window;
use markdeco_core::parse_tree;
use markdeco_core::Snapshot;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;
use tracing::trace;
use url::Url;

#[derive(Clone, Copy, Debug)]
pub struct EngineOptions {
    /// Memory budget for the document cache, in cost-model units.
    pub budget: usize,
    pub debounce: Duration,
    pub clear: ClearOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            budget: 16 * 1024 * 1024,
            debounce: DEFAULT_DEBOUNCE,
            clear: ClearOptions::default(),
        }
    }
}

/// The composition root: cache + scheduler + decorator table.
///
/// Explicitly constructed and explicitly owned — one per process at
/// startup, a fresh one per test. Event handlers mutate it synchronously;
/// render passes are detached value objects (see [`RenderPass`]) so a pass
/// in flight never holds the engine across an await.
pub struct DecorationEngine {
    cache: DocumentCache,
    scheduler: RenderScheduler,
    table: Rc<DecoratorTable>,
    options: EngineOptions,
}

impl DecorationEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_table(options, decorators::standard_table())
    }

    /// An engine with a caller-supplied decorator table.
    pub fn with_table(options: EngineOptions, table: DecoratorTable) -> Self {
        Self {
            cache: DocumentCache::new(options.budget),
            scheduler: RenderScheduler::new(options.debounce),
            table: Rc::new(table),
            options,
        }
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn enabled(&self) -> bool {
        self.scheduler.enabled()
    }

    /// Globally enables/disables decoration. Disabling clears every cached
    /// document's decorations and annotations on the host; state itself is
    /// kept so re-enabling only needs a render.
    pub fn set_enabled(&mut self, host: &mut dyn EditorHost, enabled: bool) {
        if self.scheduler.set_enabled(enabled) {
            self.cache.clear_all_decorations(host);
        }
    }

    /// Editor switched to (or opened) `doc`. Returns whether the document
    /// is tracked; tracked activations schedule a render.
    pub fn activate(
        &mut self,
        host: &mut dyn EditorHost,
        doc: DocumentInput,
        selection: Range<usize>,
        now: Instant,
    ) -> bool {
        let tracked = self.cache.activate(host, doc, selection);
        if tracked {
            self.scheduler.trigger(now);
        }
        tracked
    }

    pub fn on_edit(&mut self, host: &mut dyn EditorHost, uri: &Url, text: String, now: Instant) {
        self.cache.update_text(host, uri, text);
        self.scheduler.trigger(now);
    }

    pub fn on_selection(&mut self, uri: &Url, selection: Range<usize>, now: Instant) {
        self.cache.update_selection(uri, selection);
        self.scheduler.trigger(now);
    }

    pub fn on_visibility(&mut self, now: Instant) {
        self.scheduler.trigger(now);
    }

    /// Polls the debounce window. True means the host should run
    /// [`DecorationEngine::render`] now.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.scheduler.take_ready(now) && self.cache.active().is_some()
    }

    /// Starts a pass over the active document, superseding any pass still
    /// in flight. `visible` holds the visible line ranges (one per view).
    /// No active tracked document means no pass.
    pub fn begin_pass(&mut self, visible: &[Range<usize>]) -> Option<RenderPass> {
        let state = self.cache.active()?;
        state.bump_generation();
        let guard = GenerationGuard::capture(state.generation());
        trace!(uri = %state.uri, generation = state.current_generation(), "render pass started");
        Some(RenderPass {
            uri: state.uri.clone(),
            snapshot: state.snapshot.clone(),
            windows: windows_for(&state.snapshot, visible),
            table: Rc::clone(&self.table),
            guard,
        })
    }

    /// Applies a completed pass: accumulates ranges per kind, filters under
    /// the cursor, pushes batches to the host, reconciles annotations, then
    /// re-costs and evicts. Stale passes are dropped whole.
    pub fn commit(&mut self, host: &mut dyn EditorHost, pass: CompletedPass) {
        if pass.guard.is_stale() {
            trace!(uri = %pass.uri, "stale pass dropped at finalize");
            return;
        }
        let Some(state) = self.cache.get_mut(&pass.uri) else {
            return;
        };
        let selection = state
            .snapshot
            .range_at(state.selection.start, state.selection.end);
        let cursor_line = state.snapshot.line_range_of(state.selection.start);
        state.decorations.begin_pass();
        for (kind, range) in pass.output.decorations {
            state.decorations.push(kind, range);
        }
        state
            .decorations
            .finish(host, &pass.uri, self.options.clear, selection, cursor_line);
        state.pending_annotations = pass.output.annotations;
        state
            .annotations
            .reconcile(host, &pass.uri, &state.pending_annotations);
        self.cache.refresh_footprint(&pass.uri);
        self.cache.evict_if_over_budget(host);
    }

    /// One full debounced render: begin, traverse, commit.
    pub async fn render(
        &mut self,
        host: &mut dyn EditorHost,
        renderer: &dyn ImageRenderer,
        visible: &[Range<usize>],
    ) {
        let Some(pass) = self.begin_pass(visible) else {
            return;
        };
        if let Some(done) = pass.run(renderer).await {
            self.commit(host, done);
        }
    }
}

/// A detached, in-flight render pass: owns its snapshot and windows, shares
/// the decorator table, and carries the generation guard that lets a newer
/// pass abort it.
pub struct RenderPass {
    uri: Url,
    snapshot: Snapshot,
    windows: Vec<Window>,
    table: Rc<DecoratorTable>,
    guard: GenerationGuard,
}

impl RenderPass {
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Normalizes, parses and visits every window in order. Returns `None`
    /// when superseded mid-traversal.
    pub async fn run(self, renderer: &dyn ImageRenderer) -> Option<CompletedPass> {
        let mut output = PassOutput::default();
        let mut memo = HashMap::new();
        for window in &self.windows {
            let normalized = normalize_window(&self.snapshot, window);
            let tree = parse_tree(&normalized.text);
            let visitor = TreeVisitor {
                table: &self.table,
                snapshot: &self.snapshot,
                renderer,
                guard: self.guard.clone(),
            };
            let finished = visitor
                .visit(&tree, window.base, normalized.prefix_len, &mut output, &mut memo)
                .await;
            if !finished {
                return None;
            }
        }
        Some(CompletedPass {
            uri: self.uri,
            guard: self.guard,
            output,
        })
    }
}

/// Output of a finished traversal, waiting for
/// [`DecorationEngine::commit`].
pub struct CompletedPass {
    uri: Url,
    guard: GenerationGuard,
    output: PassOutput,
}

impl CompletedPass {
    pub fn output(&self) -> &PassOutput {
        &self.output
    }
}
