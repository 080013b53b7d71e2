#![allow(dead_code)]

use async_trait::async_trait;
use markdeco_core::TextRange;
use markdeco_engine::error::BackendError;
use markdeco_engine::host::Annotation;
use markdeco_engine::host::AnnotationHandle;
use markdeco_engine::host::DecorationKind;
use markdeco_engine::host::EditorHost;
use markdeco_engine::host::ImageRef;
use markdeco_engine::host::ImageRenderer;
use std::collections::HashMap;
use url::Url;

/// In-memory editor host: remembers the last applied batch per
/// (document, kind) and every live annotation.
#[derive(Default)]
pub struct MockHost {
    next_id: u64,
    pub decorations: HashMap<(Url, DecorationKind), Vec<TextRange>>,
    pub cleared: Vec<Url>,
    pub live: HashMap<AnnotationHandle, (Url, Annotation)>,
    pub created: usize,
    pub disposed: usize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self, uri: &Url, kind: DecorationKind) -> &[TextRange] {
        self.decorations
            .get(&(uri.clone(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl EditorHost for MockHost {
    fn apply_decorations(&mut self, uri: &Url, kind: DecorationKind, ranges: &[TextRange]) {
        if ranges.is_empty() {
            self.decorations.remove(&(uri.clone(), kind));
        } else {
            self.decorations
                .insert((uri.clone(), kind), ranges.to_vec());
        }
    }

    fn clear_decorations(&mut self, uri: &Url) {
        self.decorations.retain(|(u, _), _| u != uri);
        self.cleared.push(uri.clone());
    }

    fn create_annotation(&mut self, uri: &Url, annotation: &Annotation) -> AnnotationHandle {
        self.next_id += 1;
        let handle = AnnotationHandle(self.next_id);
        self.live.insert(handle, (uri.clone(), annotation.clone()));
        self.created += 1;
        handle
    }

    fn dispose_annotation(&mut self, _: &Url, handle: AnnotationHandle) {
        self.live.remove(&handle);
        self.disposed += 1;
    }
}

/// Backend that renders instantly and deterministically.
pub struct EchoRenderer;

#[async_trait(?Send)]
impl ImageRenderer for EchoRenderer {
    async fn render(&self, source: &str) -> Result<ImageRef, BackendError> {
        Ok(ImageRef(format!("img:{source}")))
    }
}

pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///{name}")).unwrap()
}
