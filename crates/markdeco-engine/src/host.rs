use crate::error::BackendError;
use async_trait::async_trait;
use markdeco_core::TextRange;
use url::Url;

/// A named visual style. All ranges of one kind are applied to the host in
/// a single batch; what the style looks like is the host's business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Heading(u8),
    HiddenMarkup,
    Bullet,
    Checkbox,
    EmphasisText,
    StrongText,
    StrikethroughText,
    InlineCodeText,
    CodeFence,
    LinkText,
    HorizontalRule,
}

/// Opaque host-side identity of one inline annotation. Handle reuse across
/// renders is what preserves host state such as expand/collapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationHandle(pub u64);

/// A displayable reference produced by the image backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef(pub String);

/// One inline image preview: a rendered image attached to a source range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub range: TextRange,
    /// The text the image was rendered from (url, formula, table source);
    /// part of the reuse key.
    pub target: String,
    pub label: String,
    pub image: ImageRef,
    pub collapsed: bool,
}

/// Everything the engine produces goes through this trait; the engine never
/// touches editor API directly.
pub trait EditorHost {
    /// Replaces all decorations of `kind` on `uri` with `ranges`. An empty
    /// batch clears the kind.
    fn apply_decorations(&mut self, uri: &Url, kind: DecorationKind, ranges: &[TextRange]);

    /// Drops every decoration on `uri`, all kinds. Called on eviction and
    /// when the engine is disabled.
    fn clear_decorations(&mut self, uri: &Url);

    fn create_annotation(&mut self, uri: &Url, annotation: &Annotation) -> AnnotationHandle;

    fn dispose_annotation(&mut self, uri: &Url, handle: AnnotationHandle);
}

/// External capability to render a styled image from a piece of text
/// (math formula, table source, image url). May suspend; failures skip the
/// one decoration, never the render.
#[async_trait(?Send)]
pub trait ImageRenderer {
    async fn render(&self, source: &str) -> Result<ImageRef, BackendError>;
}
