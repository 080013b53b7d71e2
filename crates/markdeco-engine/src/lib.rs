//! `markdeco-engine` renders live visual decorations over markdown source
//! text without mutating it: enlarged headings, hidden syntax markers,
//! bullets, and inline image previews for math, diagrams and tables.
//!
//! The engine is host-agnostic and event-loop agnostic: you feed it editor
//! events (activation, edits, selection, visibility), drive its debounce
//! clock from your loop, and it talks back through the [`host::EditorHost`]
//! trait (batched decoration applies, annotation create/dispose) and the
//! [`host::ImageRenderer`] trait (async text-to-image backend).
//!
//! ## Pieces
//!
//! - [`cache::DocumentCache`]: per-document derived state, LRU-evicted
//!   under a memory budget; the active document is never evicted.
//! - [`scheduler::RenderScheduler`]: coalesces event bursts into one render
//!   per quiescent window.
//! - [`window`]: restricts work to visible ranges plus margin on large
//!   documents.
//! - [`normalize`]: synthesizes list/fence context so a window that starts
//!   mid-construct still parses correctly.
//! - [`visit`]: explicit-stack tree traversal dispatching to
//!   [`visit::Decorator`] strategies, awaited in source order.
//! - [`accumulate`]: per-kind range batching with cursor-reveal filtering.
//! - [`annotations`]: generation diff that reuses unchanged annotation
//!   handles instead of recreating them.
//! - [`engine::DecorationEngine`]: the composition root. Explicitly
//!   constructed, never a global; make a fresh one per test.
//!
//! ## Minimal flow
//!
//! ```ignore
//! let mut engine = DecorationEngine::new(EngineOptions::default());
//! engine.activate(&mut host, doc, 0..0, now);
//! engine.on_edit(&mut host, &uri, new_text, now);
//! if engine.tick(later) {
//!     engine.render(&mut host, &renderer, &visible_lines).await;
//! }
//! ```
//!
//! Overlapping renders are tolerated: every pass captures a per-document
//! generation and aborts itself as soon as a newer pass supersedes it.
pub mod accumulate;
pub mod annotations;
pub mod cache;
pub mod decorators;
pub mod engine;
pub mod error;
pub mod host;
pub mod normalize;
pub mod scheduler;
pub mod visit;
pub mod window;

pub use cache::DocumentCache;
pub use cache::DocumentInput;
pub use engine::DecorationEngine;
pub use engine::EngineOptions;
pub use error::DecorateError;
pub use host::DecorationKind;
pub use host::EditorHost;
pub use host::ImageRenderer;
