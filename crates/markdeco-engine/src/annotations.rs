use crate::host::Annotation;
use crate::host::AnnotationHandle;
use crate::host::EditorHost;
use markdeco_core::TextRange;
use std::collections::HashMap;
use url::Url;

/// Reuse key for one annotation: resolved source range plus render target.
/// Label and image content deliberately stay out of the key, so a retitled
/// but otherwise identical preview keeps its handle (and its host-side
/// expand/collapse state).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationKey {
    pub range: TextRange,
    pub target: String,
}

impl AnnotationKey {
    fn of(annotation: &Annotation) -> Self {
        Self {
            range: annotation.range,
            target: annotation.target.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub reused: usize,
    pub disposed: usize,
}

/// Per-document annotation state across renders: the previous generation's
/// key → handle map, diffed against each fresh annotation list.
#[derive(Debug, Default)]
pub struct AnnotationSet {
    handles: HashMap<AnnotationKey, AnnotationHandle>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handle_of(&self, key: &AnnotationKey) -> Option<AnnotationHandle> {
        self.handles.get(key).copied()
    }

    /// Diffs `fresh` against the previous generation. Keys in both carry
    /// their handle forward unchanged; new keys create; keys only in the
    /// old generation dispose exactly once. Within one pass, duplicate
    /// (position, target) entries keep only the first.
    pub fn reconcile(
        &mut self,
        host: &mut dyn EditorHost,
        uri: &Url,
        fresh: &[Annotation],
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut next = HashMap::with_capacity(fresh.len());
        for annotation in fresh {
            let key = AnnotationKey::of(annotation);
            if next.contains_key(&key) {
                continue;
            }
            match self.handles.remove(&key) {
                Some(handle) => {
                    next.insert(key, handle);
                    stats.reused += 1;
                }
                None => {
                    let handle = host.create_annotation(uri, annotation);
                    next.insert(key, handle);
                    stats.created += 1;
                }
            }
        }
        for handle in self.handles.drain().map(|(_, h)| h) {
            host.dispose_annotation(uri, handle);
            stats.disposed += 1;
        }
        self.handles = next;
        stats
    }

    /// Disposes everything, used when a document is torn down while its
    /// annotations should not linger.
    pub fn dispose_all(&mut self, host: &mut dyn EditorHost, uri: &Url) -> usize {
        let disposed = self.handles.len();
        for handle in self.handles.drain().map(|(_, h)| h) {
            host.dispose_annotation(uri, handle);
        }
        disposed
    }
}
