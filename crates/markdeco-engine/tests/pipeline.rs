mod common;

use async_trait::async_trait;
use common::uri;
use common::EchoRenderer;
use common::MockHost;
use futures::executor::block_on;
use markdeco_core::parse_tree;
use markdeco_core::Node;
use markdeco_core::NodeTag;
use markdeco_core::Snapshot;
use markdeco_core::TextRange;
use markdeco_engine::accumulate::ClearOptions;
use markdeco_engine::cache::DocumentInput;
use markdeco_engine::decorators::standard_table;
use markdeco_engine::error::DecorateError;
use markdeco_engine::host::DecorationKind;
use markdeco_engine::normalize::normalize_window;
use markdeco_engine::visit::DecorateCx;
use markdeco_engine::visit::Decorator;
use markdeco_engine::visit::DecoratorTable;
use markdeco_engine::visit::GenerationGuard;
use markdeco_engine::visit::PassOutput;
use markdeco_engine::visit::TreeVisitor;
use markdeco_engine::window::windows_for;
use markdeco_engine::DecorationEngine;
use markdeco_engine::EngineOptions;
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

fn doc(name: &str, text: &str) -> DocumentInput {
    DocumentInput::new(uri(name), "markdown", text)
}

struct Recorder {
    calls: Rc<RefCell<Vec<(NodeTag, Range<usize>)>>>,
}

#[async_trait(?Send)]
impl Decorator for Recorder {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError> {
        self.calls.borrow_mut().push((node.tag(), cx.span()));
        Ok(())
    }
}

#[test]
fn heading_and_emphasis_offsets_through_the_full_pipeline() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut table = DecoratorTable::new();
    for tag in [NodeTag::Heading, NodeTag::Emphasis] {
        table.register(
            tag,
            Box::new(Recorder {
                calls: Rc::clone(&calls),
            }),
        );
    }
    let mut engine = DecorationEngine::with_table(EngineOptions::default(), table);
    let mut host = MockHost::new();
    let now = Instant::now();
    assert!(engine.activate(&mut host, doc("t.md", "# Title\n\nSome *text*.\n"), 0..0, now));
    block_on(engine.render(&mut host, &EchoRenderer, &[0..3]));

    let calls = calls.borrow();
    assert_eq!(calls[0], (NodeTag::Heading, 0..7));
    assert_eq!(calls[1], (NodeTag::Emphasis, 14..20));
}

#[test]
fn rerendering_unchanged_text_is_idempotent() {
    let mut engine = DecorationEngine::new(EngineOptions::default());
    let mut host = MockHost::new();
    let now = Instant::now();
    let text = "# Title\n\nSome *text* and $x^2$.\n\n![a](img.png)\n";
    engine.activate(&mut host, doc("t.md", text), 0..0, now);
    block_on(engine.render(&mut host, &EchoRenderer, &[0..6]));

    let decorations = host.decorations.clone();
    let created = host.created;
    assert!(created > 0);
    assert!(!decorations.is_empty());

    block_on(engine.render(&mut host, &EchoRenderer, &[0..6]));
    assert_eq!(host.decorations, decorations);
    assert_eq!(host.created, created);
    assert_eq!(host.disposed, 0);
}

#[test]
fn annotations_reuse_handles_and_dispose_vanished_ones() {
    let mut engine = DecorationEngine::new(EngineOptions::default());
    let mut host = MockHost::new();
    let now = Instant::now();
    engine.activate(
        &mut host,
        doc("t.md", "![a](one.png)\n\n![b](two.png)\n"),
        0..0,
        now,
    );
    block_on(engine.render(&mut host, &EchoRenderer, &[0..3]));
    assert_eq!(host.live.len(), 2);
    let first_handle = host
        .live
        .iter()
        .find(|(_, (_, a))| a.target == "one.png")
        .map(|(h, _)| *h)
        .unwrap();

    // The first image is untouched by the edit; the second disappears.
    engine.on_edit(
        &mut host,
        &uri("t.md"),
        "![a](one.png)\n\nplain\n".to_string(),
        now,
    );
    block_on(engine.render(&mut host, &EchoRenderer, &[0..3]));
    assert_eq!(host.disposed, 1);
    assert_eq!(host.live.len(), 1);
    assert!(host.live.contains_key(&first_handle));
}

#[test]
fn windowed_and_whole_passes_agree_inside_the_core_region() {
    let mut text = String::new();
    for _ in 0..470 {
        text.push_str("filler text\n");
    }
    text.push_str("# Deep Heading\n\nSome *em* and `code`.\n\n- [x] task\n");
    for _ in 0..120 {
        text.push_str("more filler\n");
    }
    let snapshot = Snapshot::new(text);
    let core_lines = 465..485;

    let table = standard_table();
    let visit_all = |windows: &[markdeco_engine::window::Window]| {
        let mut output = PassOutput::default();
        let mut memo = HashMap::new();
        for window in windows {
            let normalized = normalize_window(&snapshot, window);
            let tree = parse_tree(&normalized.text);
            let visitor = TreeVisitor {
                table: &table,
                snapshot: &snapshot,
                renderer: &EchoRenderer,
                guard: GenerationGuard::capture(Rc::new(Cell::new(0))),
            };
            assert!(block_on(visitor.visit(
                &tree,
                window.base,
                normalized.prefix_len,
                &mut output,
                &mut memo,
            )));
        }
        output
    };

    let whole = visit_all(&[markdeco_engine::window::Window {
        lines: 0..snapshot.line_count(),
        offsets: 0..snapshot.len(),
        base: 0,
    }]);
    let windowed = visit_all(&windows_for(&snapshot, &[core_lines.clone()]));

    let in_core = |output: &PassOutput| {
        let mut kept: Vec<(String, TextRange)> = output
            .decorations
            .iter()
            .filter(|(_, r)| core_lines.contains(&(r.start.line as usize)))
            .map(|(k, r)| (format!("{k:?}"), *r))
            .collect();
        kept.sort_by(|a, b| {
            (a.1.start, a.1.end, &a.0).cmp(&(b.1.start, b.1.end, &b.0))
        });
        kept
    };
    let whole_core = in_core(&whole);
    assert!(!whole_core.is_empty());
    assert_eq!(whole_core, in_core(&windowed));
}

#[test]
fn superseded_pass_aborts_and_newer_pass_wins() {
    let mut engine = DecorationEngine::new(EngineOptions::default());
    let mut host = MockHost::new();
    let now = Instant::now();
    engine.activate(&mut host, doc("t.md", "# One\n\n# Two\n"), 0..0, now);

    let stale = engine.begin_pass(&[0..3]).unwrap();
    let current = engine.begin_pass(&[0..3]).unwrap();
    assert!(block_on(stale.run(&EchoRenderer)).is_none());
    let done = block_on(current.run(&EchoRenderer)).unwrap();
    engine.commit(&mut host, done);
    assert_eq!(host.ranges(&uri("t.md"), DecorationKind::Heading(1)).len(), 2);
}

#[test]
fn pass_completed_before_supersession_is_dropped_at_commit() {
    let mut engine = DecorationEngine::new(EngineOptions::default());
    let mut host = MockHost::new();
    let now = Instant::now();
    engine.activate(&mut host, doc("t.md", "# One\n"), 0..0, now);

    let pass = engine.begin_pass(&[0..1]).unwrap();
    let done = block_on(pass.run(&EchoRenderer)).unwrap();
    // A newer pass starts before the old one commits.
    let _newer = engine.begin_pass(&[0..1]);
    engine.commit(&mut host, done);
    assert!(host.decorations.is_empty());
}

#[test]
fn disabling_clears_host_state_and_mutes_triggers() {
    let mut engine = DecorationEngine::new(EngineOptions::default());
    let mut host = MockHost::new();
    let now = Instant::now();
    engine.activate(&mut host, doc("t.md", "# Title\n\n$x$\n"), 0..0, now);
    block_on(engine.render(&mut host, &EchoRenderer, &[0..3]));
    assert!(!host.decorations.is_empty());
    assert_eq!(host.live.len(), 1);

    engine.set_enabled(&mut host, false);
    assert!(host.decorations.is_empty());
    assert!(host.live.is_empty());

    engine.on_edit(&mut host, &uri("t.md"), "# Title\n".to_string(), now);
    assert!(!engine.tick(now + Duration::from_secs(5)));
}

#[test]
fn cursor_line_reveals_the_raw_syntax() {
    let options = EngineOptions {
        clear: ClearOptions {
            under_cursor_line: true,
            under_cursor: false,
        },
        ..EngineOptions::default()
    };
    let mut engine = DecorationEngine::new(options);
    let mut host = MockHost::new();
    let now = Instant::now();
    // Cursor sits on the heading line.
    engine.activate(&mut host, doc("t.md", "# Title\n\n*em*\n"), 2..2, now);
    block_on(engine.render(&mut host, &EchoRenderer, &[0..3]));

    assert!(host.ranges(&uri("t.md"), DecorationKind::Heading(1)).is_empty());
    for range in host.ranges(&uri("t.md"), DecorationKind::HiddenMarkup) {
        assert_eq!(range.start.line, 2);
    }
    assert_eq!(
        host.ranges(&uri("t.md"), DecorationKind::EmphasisText).len(),
        1
    );
}

#[test]
fn debounce_coalesces_bursts_into_one_render() {
    let options = EngineOptions {
        debounce: Duration::from_millis(100),
        ..EngineOptions::default()
    };
    let mut engine = DecorationEngine::new(options);
    let mut host = MockHost::new();
    let t0 = Instant::now();
    engine.activate(&mut host, doc("t.md", "# Title\n"), 0..0, t0);
    assert!(!engine.tick(t0));
    assert!(!engine.tick(t0 + Duration::from_millis(50)));

    // A fresh edit inside the window restarts the countdown.
    engine.on_edit(&mut host, &uri("t.md"), "# Title!\n".to_string(), t0 + Duration::from_millis(80));
    assert!(!engine.tick(t0 + Duration::from_millis(120)));
    assert!(engine.tick(t0 + Duration::from_millis(180)));
    assert!(!engine.tick(t0 + Duration::from_millis(500)));
}
