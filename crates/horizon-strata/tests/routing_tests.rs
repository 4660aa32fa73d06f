//! Integration tests for action routing, self-updates and reentrant renders.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use horizon_strata::prelude::*;
use horizon_strata::{ActionSender, ApplySummary};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A switch that flips on select and counts taps without repainting.
#[derive(Clone, PartialEq, Debug)]
struct Toggle {
    key: &'static str,
    on: bool,
    taps: u32,
}

impl Identifiable for Toggle {
    type Id = &'static str;

    fn id(&self) -> &'static str {
        self.key
    }

    fn should_content_update(&self, next: &Self) -> bool {
        self.on != next.on
    }
}

impl Component for Toggle {
    type Content = String;

    fn render_content(&self) -> String {
        String::new()
    }

    fn render(&self, content: &mut String) {
        *content = format!("{}:{}", self.key, if self.on { "on" } else { "off" });
    }

    fn self_update(&self, context: &ActionContext) -> Option<Self> {
        match context.kind() {
            ActionKind::Select => Some(Self {
                on: !self.on,
                ..self.clone()
            }),
            kind if kind.name() == "tap" => Some(Self {
                taps: self.taps + 1,
                ..self.clone()
            }),
            _ => None,
        }
    }
}

fn toggle(key: &'static str) -> Toggle {
    Toggle {
        key,
        on: false,
        taps: 0,
    }
}

fn renderer() -> Renderer<HeadlessSurface> {
    init_tracing();
    Renderer::attached(HeadlessSurface::new(), RendererConfig::default())
}

fn sender_at(renderer: &Renderer<HeadlessSurface>, at: Locator) -> ActionSender {
    renderer
        .with_surface(|s| s.sender_at(at))
        .flatten()
        .expect("element at locator")
}

fn text_at(renderer: &Renderer<HeadlessSurface>, at: Locator) -> Option<String> {
    renderer
        .with_surface(|s| s.content::<String>(at).cloned())
        .flatten()
}

fn count_applied(renderer: &Renderer<HeadlessSurface>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    renderer.signals().applied.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn test_self_update_with_equal_content_is_patched() {
    let renderer = renderer();
    renderer.render_cells([toggle("a")]).expect("render");
    let applied = count_applied(&renderer);

    let patched = Arc::new(Mutex::new(Vec::new()));
    let sink = patched.clone();
    renderer
        .signals()
        .slot_updated
        .connect(move |at| sink.lock().push(*at));

    let outcome = sender_at(&renderer, Locator::cell(0, 0)).send(ActionKind::custom("tap"));
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::Patched,
            handlers: 0,
        }
    );

    assert_eq!(applied.load(Ordering::SeqCst), 0);
    assert_eq!(*patched.lock(), vec![Locator::cell(0, 0)]);
    let component = renderer.component(Locator::cell(0, 0)).expect("component");
    assert_eq!(component.downcast_ref::<Toggle>().map(|t| t.taps), Some(1));
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:off"));
}

#[test]
fn test_self_update_with_changed_content_rerenders() {
    let renderer = renderer();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    renderer
        .render_cells([toggle("a").on(ActionKind::Select, move |ctx| {
            sink.lock().push(ctx.component_as::<Toggle>().map(|t| t.on));
        })])
        .expect("render");
    let applied = count_applied(&renderer);

    let outcome = sender_at(&renderer, Locator::cell(0, 0)).send(ActionKind::Select);
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::Rerendered,
            handlers: 1,
        }
    );

    assert_eq!(applied.load(Ordering::SeqCst), 1);
    // The handler sees the replacement, not the component that was tapped.
    assert_eq!(*seen.lock(), vec![Some(true)]);
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:on"));
    // The replacement kept the node's handlers.
    assert_eq!(
        renderer.node(Locator::cell(0, 0)).map(|n| n.handler_count()),
        Some(1)
    );
}

#[test]
fn test_moved_element_routes_to_its_new_node() {
    let renderer = renderer();
    let log = Arc::new(Mutex::new(Vec::new()));

    let tree = |labels: [&'static str; 2], first: Toggle, second: Toggle| {
        let (left, right) = (log.clone(), log.clone());
        Section::new("switches")
            .with_cell(first.on(ActionKind::DidLoad, move |ctx| {
                left.lock().push((labels[0], ctx.locator()));
            }))
            .with_cell(second.on(ActionKind::DidLoad, move |ctx| {
                right.lock().push((labels[1], ctx.locator()));
            }))
    };

    renderer
        .render([tree(["a1", "b1"], toggle("a"), toggle("b"))])
        .expect("first render");
    let b = sender_at(&renderer, Locator::cell(0, 1));

    let changed_a = Toggle {
        on: true,
        ..toggle("a")
    };
    renderer
        .render([tree(["b2", "a2"], toggle("b"), changed_a)])
        .expect("second render");

    assert_eq!(text_at(&renderer, Locator::cell(0, 1)).as_deref(), Some("a:on"));
    assert!(b.send(ActionKind::DidLoad).is_handled());
    assert_eq!(*log.lock(), vec![("b2", Locator::cell(0, 0))]);
}

#[test]
fn test_action_from_removed_element_is_dropped() {
    let renderer = renderer();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    renderer
        .render_cells([
            Node::new(toggle("a")),
            toggle("b").on(ActionKind::Select, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ])
        .expect("first render");
    let b = sender_at(&renderer, Locator::cell(0, 1));

    let dropped = Arc::new(Mutex::new(Vec::new()));
    let sink = dropped.clone();
    renderer
        .signals()
        .action_dropped
        .connect(move |reason| sink.lock().push(*reason));

    renderer.render_cells([toggle("a")]).expect("second render");
    let before = renderer.dump_tree();

    assert_eq!(
        b.send(ActionKind::Select),
        RouteOutcome::Dropped(DropReason::Detached)
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(*dropped.lock(), vec![DropReason::Detached]);
    assert_eq!(renderer.dump_tree(), before);
}

#[test]
fn test_action_without_handlers_still_reaches_the_node() {
    let renderer = renderer();
    renderer
        .render_cells([toggle("a").on(ActionKind::Select, |_| {})])
        .expect("render");

    let triggered = Arc::new(AtomicUsize::new(0));
    let counter = triggered.clone();
    renderer.signals().action_triggered.connect(move |ctx| {
        assert_eq!(ctx.kind(), &ActionKind::custom("swipe"));
        assert_eq!(ctx.payload_as::<u8>(), Some(&3));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let outcome =
        sender_at(&renderer, Locator::cell(0, 0)).send_with(ActionKind::custom("swipe"), 3u8);
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::None,
            handlers: 0,
        }
    );
    assert_eq!(triggered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handlers_run_in_registration_order() {
    let renderer = renderer();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (first, second, third) = (order.clone(), order.clone(), order.clone());
    renderer
        .render_cells([Node::new(toggle("a"))
            .on(ActionKind::DidLoad, move |_| first.lock().push(1))
            .on(ActionKind::Select, move |_| second.lock().push(2))
            .on(ActionKind::DidLoad, move |_| third.lock().push(3))])
        .expect("render");

    let outcome = sender_at(&renderer, Locator::cell(0, 0)).send(ActionKind::DidLoad);
    assert_eq!(outcome.handler_count(), 2);
    assert_eq!(*order.lock(), vec![1, 3]);
}

#[test]
fn test_handler_can_render_a_new_tree() {
    let renderer = renderer();
    let weak = renderer.downgrade();
    renderer
        .render_cells([toggle("a").on(ActionKind::DidLoad, move |_| {
            if let Some(renderer) = weak.upgrade() {
                renderer
                    .render_cells([toggle("a"), toggle("b")])
                    .expect("render from handler");
            }
        })])
        .expect("render");

    assert!(
        sender_at(&renderer, Locator::cell(0, 0))
            .send(ActionKind::DidLoad)
            .is_handled()
    );
    assert_eq!(renderer.lookup_id("b"), Some(Locator::cell(0, 1)));
    assert_eq!(renderer.with_surface(|s| s.row_count(0)), Some(2));
}

#[test]
fn test_render_from_applied_slot_is_deferred() {
    let renderer = renderer();
    let summaries: Arc<Mutex<Vec<(usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));

    let weak = renderer.downgrade();
    let sink = summaries.clone();
    renderer
        .signals()
        .applied
        .connect(move |summary: &ApplySummary| {
            let Some(renderer) = weak.upgrade() else {
                return;
            };
            sink.lock().push((summary.rows, renderer.is_rendering()));
            if summary.rows == 1 {
                // Queued behind the running pass, applied right after it.
                renderer
                    .render_cells([toggle("a"), toggle("b")])
                    .expect("deferred render");
                assert_eq!(renderer.data()[0].cell_count(), 1);
            }
        });

    renderer.render_cells([toggle("a")]).expect("render");

    assert_eq!(*summaries.lock(), vec![(1, true), (2, true)]);
    assert!(!renderer.is_rendering());
    assert_eq!(renderer.with_surface(|s| s.row_count(0)), Some(2));
}

#[test]
fn test_action_sent_while_surface_is_borrowed_is_busy() {
    let renderer = renderer();
    renderer.render_cells([toggle("a")]).expect("render");

    let outcome = renderer.with_surface(|s| {
        s.sender_at(Locator::cell(0, 0))
            .map(|sender| sender.send(ActionKind::Select))
    });
    assert_eq!(
        outcome.flatten(),
        Some(RouteOutcome::Dropped(DropReason::Busy))
    );
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:off"));
}

#[test]
fn test_patched_component_is_repainted() {
    let renderer = renderer();
    renderer.render_cells([toggle("a")]).expect("render");

    let switched_on = Toggle {
        on: true,
        ..toggle("a")
    };
    assert!(renderer.update_component(switched_on.clone(), Locator::cell(0, 0)));
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:on"));

    // The tree already holds the patch, so this render is a no-op.
    renderer.render_cells([switched_on]).expect("render");
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:on"));
}

#[test]
fn test_action_sent_during_a_pass_is_busy() {
    let renderer = renderer();
    renderer.render_cells([toggle("a")]).expect("render");
    let a = sender_at(&renderer, Locator::cell(0, 0));

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = outcomes.clone();
    let sent = AtomicBool::new(false);
    let inner = a.clone();
    renderer.signals().applied.connect(move |_| {
        if sent.swap(true, Ordering::SeqCst) {
            return;
        }
        let first = inner.send(ActionKind::Select);
        let second = inner.send(ActionKind::Select);
        sink.lock().extend([first, second]);
    });

    renderer
        .render_cells([toggle("a"), toggle("b")])
        .expect("render");
    assert_eq!(
        *outcomes.lock(),
        vec![RouteOutcome::Dropped(DropReason::Busy); 2]
    );
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("a:off"));

    // Between passes both flips land.
    for expected in ["a:on", "a:off"] {
        assert_eq!(
            a.send(ActionKind::Select),
            RouteOutcome::Handled {
                self_update: SelfUpdate::Rerendered,
                handlers: 0,
            }
        );
        assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some(expected));
    }
}

fn framed(seen: &Arc<Mutex<Vec<(Locator, Option<bool>)>>>) -> Section {
    let (header_seen, footer_seen) = (seen.clone(), seen.clone());
    Section::new("framed")
        .with_header(toggle("h").on(ActionKind::Select, move |ctx| {
            header_seen
                .lock()
                .push((ctx.locator(), ctx.component_as::<Toggle>().map(|t| t.on)));
        }))
        .with_cell(toggle("c"))
        .with_footer(toggle("f").on(ActionKind::DidLoad, move |ctx| {
            footer_seen
                .lock()
                .push((ctx.locator(), ctx.component_as::<Toggle>().map(|t| t.on)));
        }))
}

#[test]
fn test_header_self_update_rerenders_and_runs_handlers() {
    let renderer = renderer();
    let seen = Arc::new(Mutex::new(Vec::new()));
    renderer.render([framed(&seen)]).expect("render");

    let outcome = sender_at(&renderer, Locator::header(0)).send(ActionKind::Select);
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::Rerendered,
            handlers: 1,
        }
    );
    assert_eq!(*seen.lock(), vec![(Locator::header(0), Some(true))]);
    assert_eq!(text_at(&renderer, Locator::header(0)).as_deref(), Some("h:on"));
    assert_eq!(
        renderer.node(Locator::header(0)).map(|n| n.handler_count()),
        Some(1)
    );
    assert_eq!(text_at(&renderer, Locator::cell(0, 0)).as_deref(), Some("c:off"));
}

#[test]
fn test_header_self_update_with_equal_content_is_patched() {
    let renderer = renderer();
    let seen = Arc::new(Mutex::new(Vec::new()));
    renderer.render([framed(&seen)]).expect("render");
    let applied = count_applied(&renderer);

    let outcome = sender_at(&renderer, Locator::header(0)).send(ActionKind::custom("tap"));
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::Patched,
            handlers: 0,
        }
    );
    assert_eq!(applied.load(Ordering::SeqCst), 0);
    let header = renderer.component(Locator::header(0)).expect("header");
    assert_eq!(header.downcast_ref::<Toggle>().map(|t| t.taps), Some(1));
    assert_eq!(text_at(&renderer, Locator::header(0)).as_deref(), Some("h:off"));
}

#[test]
fn test_footer_action_reaches_its_handler() {
    let renderer = renderer();
    let seen = Arc::new(Mutex::new(Vec::new()));
    renderer.render([framed(&seen)]).expect("render");

    let outcome = sender_at(&renderer, Locator::footer(0)).send(ActionKind::DidLoad);
    assert_eq!(
        outcome,
        RouteOutcome::Handled {
            self_update: SelfUpdate::None,
            handlers: 1,
        }
    );
    assert_eq!(*seen.lock(), vec![(Locator::footer(0), Some(false))]);
}
