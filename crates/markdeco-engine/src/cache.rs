use crate::accumulate::DecorationMap;
use crate::annotations::AnnotationSet;
use crate::host::Annotation;
use crate::host::EditorHost;
use markdeco_core::Snapshot;
use std::cell::Cell;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;
use tracing::debug;
use url::Url;

/// Language id of documents the engine tracks.
pub const TRACKED_LANGUAGE: &str = "markdown";

/// A document as the host hands it over on activation or edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInput {
    pub uri: Url,
    pub language_id: String,
    pub text: String,
}

impl DocumentInput {
    pub fn new(uri: Url, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            text: text.into(),
        }
    }
}

/// Footprint estimator for one cached document. Injectable so eviction-order
/// tests can use exact deterministic costs instead of the heuristic.
pub trait CostModel {
    fn cost(&self, state: &DocumentState) -> usize;
}

/// Production costing: weighted per source byte plus fixed overhead per
/// annotation and per decoration range. A heuristic, not exact accounting,
/// but monotonic in document size, which is all eviction needs.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicCost;

impl HeuristicCost {
    const BYTE_WEIGHT: usize = 2;
    const ANNOTATION_OVERHEAD: usize = 160;
    const RANGE_OVERHEAD: usize = 48;
}

impl CostModel for HeuristicCost {
    fn cost(&self, state: &DocumentState) -> usize {
        state.snapshot.len() * Self::BYTE_WEIGHT
            + state.pending_annotations.len() * Self::ANNOTATION_OVERHEAD
            + state.decorations.range_count() * Self::RANGE_OVERHEAD
    }
}

/// Derived state for one tracked open document.
#[derive(Debug)]
pub struct DocumentState {
    pub uri: Url,
    pub snapshot: Snapshot,
    /// Byte-offset selection within the snapshot.
    pub selection: Range<usize>,
    pub decorations: DecorationMap,
    /// Annotations produced by the latest committed pass; input to the
    /// reconciler and to the cost model.
    pub pending_annotations: Vec<Annotation>,
    pub annotations: AnnotationSet,
    /// Footprint as of the last costing, kept so usage can be maintained by
    /// delta instead of resummed.
    pub footprint: usize,
    generation: Rc<Cell<u64>>,
}

impl DocumentState {
    fn new(uri: Url, text: String) -> Self {
        Self {
            uri,
            snapshot: Snapshot::new(text),
            selection: 0..0,
            decorations: DecorationMap::new(),
            pending_annotations: Vec::new(),
            annotations: AnnotationSet::new(),
            footprint: 0,
            generation: Rc::new(Cell::new(0)),
        }
    }

    /// Shared generation cell: a render pass keeps a clone and aborts once
    /// the value moves past the one it captured.
    pub fn generation(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.generation)
    }

    /// Starts a new render generation, superseding any in-flight pass.
    pub fn bump_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.get()
    }
}

/// Process-wide cache of per-document decoration state, bounded by a memory
/// budget with LRU eviction. Explicitly constructed and owned — construct
/// one at startup and a fresh one per test.
pub struct DocumentCache {
    docs: HashMap<Url, DocumentState>,
    /// Access order, oldest first, no duplicates; always equals the key set
    /// of `docs`.
    order: VecDeque<Url>,
    active: Option<Url>,
    budget: usize,
    usage: usize,
    cost: Box<dyn CostModel>,
}

impl DocumentCache {
    pub fn new(budget: usize) -> Self {
        Self::with_cost_model(budget, Box::new(HeuristicCost))
    }

    pub fn with_cost_model(budget: usize, cost: Box<dyn CostModel>) -> Self {
        Self {
            docs: HashMap::new(),
            order: VecDeque::new(),
            active: None,
            budget,
            usage: 0,
            cost,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn usage(&self) -> usize {
        self.usage
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.docs.contains_key(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<&DocumentState> {
        self.docs.get(uri)
    }

    pub fn get_mut(&mut self, uri: &Url) -> Option<&mut DocumentState> {
        self.docs.get_mut(uri)
    }

    pub fn active_uri(&self) -> Option<&Url> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&DocumentState> {
        self.docs.get(self.active.as_ref()?)
    }

    pub fn active_mut(&mut self) -> Option<&mut DocumentState> {
        let uri = self.active.clone()?;
        self.docs.get_mut(&uri)
    }

    /// Access order snapshot, oldest first. Test hook for the queue
    /// invariants.
    pub fn order(&self) -> impl Iterator<Item = &Url> {
        self.order.iter()
    }

    /// Tracks `doc` if its content type matches: ensures a `DocumentState`
    /// (creating it on first sight, refreshing the snapshot on
    /// reactivation), promotes it to most-recently-used, marks it active
    /// and runs eviction. Non-tracked documents clear the active pointer.
    pub fn activate(
        &mut self,
        host: &mut dyn EditorHost,
        doc: DocumentInput,
        selection: Range<usize>,
    ) -> bool {
        if doc.language_id != TRACKED_LANGUAGE {
            self.active = None;
            return false;
        }
        let DocumentInput { uri, text, .. } = doc;
        if let Some(state) = self.docs.get_mut(&uri) {
            if state.snapshot.text() != text {
                state.snapshot = Snapshot::new(text);
                let cost = self.cost.cost(state);
                Self::apply_cost(&mut self.usage, state, cost);
            }
            state.selection = selection;
        } else {
            let mut state = DocumentState::new(uri.clone(), text);
            state.selection = selection;
            let cost = self.cost.cost(&state);
            Self::apply_cost(&mut self.usage, &mut state, cost);
            self.docs.insert(uri.clone(), state);
            debug!(%uri, usage = self.usage, "tracking document");
        }
        self.touch(&uri);
        self.active = Some(uri);
        self.evict_if_over_budget(host);
        true
    }

    /// Refreshes the snapshot after an edit and adjusts usage by the size
    /// delta. Unknown documents are ignored.
    pub fn update_text(&mut self, host: &mut dyn EditorHost, uri: &Url, text: String) {
        if let Some(state) = self.docs.get_mut(uri) {
            state.snapshot = Snapshot::new(text);
            let cost = self.cost.cost(state);
            Self::apply_cost(&mut self.usage, state, cost);
            self.touch(uri);
            self.evict_if_over_budget(host);
        }
    }

    pub fn update_selection(&mut self, uri: &Url, selection: Range<usize>) {
        if let Some(state) = self.docs.get_mut(uri) {
            state.selection = selection;
        }
    }

    /// Re-costs one document after a committed pass changed its derived
    /// state (decorations, annotations).
    pub fn refresh_footprint(&mut self, uri: &Url) {
        if let Some(state) = self.docs.get_mut(uri) {
            let cost = self.cost.cost(state);
            Self::apply_cost(&mut self.usage, state, cost);
        }
    }

    /// While usage exceeds the budget and more than one document remains:
    /// pop the least-recently-used entry; the active document is requeued
    /// instead of evicted, anything else is cleared on the host and
    /// discarded.
    pub fn evict_if_over_budget(&mut self, host: &mut dyn EditorHost) {
        while self.usage > self.budget && self.docs.len() > 1 {
            let Some(uri) = self.order.pop_front() else {
                break;
            };
            if self.active.as_ref() == Some(&uri) {
                self.order.push_back(uri);
                continue;
            }
            if let Some(mut state) = self.docs.remove(&uri) {
                state.annotations.dispose_all(host, &uri);
                host.clear_decorations(&uri);
                self.usage -= state.footprint;
                debug!(%uri, freed = state.footprint, usage = self.usage, "evicted document");
            }
        }
    }

    /// Forgets one document (host decorations cleared, annotations
    /// disposed). Used when the host closes a document.
    pub fn remove(&mut self, host: &mut dyn EditorHost, uri: &Url) {
        if let Some(mut state) = self.docs.remove(uri) {
            state.annotations.dispose_all(host, uri);
            host.clear_decorations(uri);
            self.usage -= state.footprint;
            self.order.retain(|u| u != uri);
            if self.active.as_ref() == Some(uri) {
                self.active = None;
            }
        }
    }

    /// Clears host decorations for every cached document without dropping
    /// state. Used when decoration is globally disabled.
    pub fn clear_all_decorations(&mut self, host: &mut dyn EditorHost) {
        for (uri, state) in &mut self.docs {
            state.decorations.begin_pass();
            state.annotations.dispose_all(host, uri);
            state.pending_annotations.clear();
            host.clear_decorations(uri);
        }
    }

    fn touch(&mut self, uri: &Url) {
        self.order.retain(|u| u != uri);
        self.order.push_back(uri.clone());
    }

    fn apply_cost(usage: &mut usize, state: &mut DocumentState, cost: usize) {
        *usage = *usage - state.footprint + cost;
        state.footprint = cost;
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("len", &self.docs.len())
            .field("usage", &self.usage)
            .field("budget", &self.budget)
            .field("active", &self.active)
            .finish()
    }
}
