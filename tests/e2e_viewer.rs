// logdyn-viewer - tests/e2e_viewer.rs
//
// End-to-end tests for the viewer pipeline: inbound channel messages through
// the transport, into the renderer and out as HTML.
//
// These tests use the real wire decoding, real regex filtering and real
// markup generation. Only the channel and console are in-memory stand-ins
// for the browser.

use logdyn_viewer::app::channel::MemoryChannel;
use logdyn_viewer::app::console::MemoryConsole;
use logdyn_viewer::app::renderer::Renderer;
use logdyn_viewer::app::replay::{replay, ReplaySummary};
use logdyn_viewer::app::transport::{Dispatch, Transport, TransportConfig};
use logdyn_viewer::core::model::{ChannelEvent, ConsoleMethod, LifecycleEvent, LogRecord};
use logdyn_viewer::core::wire::RawRecord;
use logdyn_viewer::ui::html;
use logdyn_viewer::util::error::TransportError;
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::rc::Rc;

// =============================================================================
// Helpers
// =============================================================================

type TestTransport = Transport<MemoryChannel, MemoryConsole>;

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn make_viewer(
    surfaces: &[&str],
    config: TransportConfig,
) -> (TestTransport, Rc<RefCell<Renderer>>) {
    let renderer = Rc::new(RefCell::new(
        Renderer::with_surfaces(surfaces.iter().copied()).unwrap(),
    ));
    let transport = Transport::new(MemoryChannel::new(), MemoryConsole::new(), config)
        .with_renderer(Box::new(Rc::clone(&renderer)));
    (transport, renderer)
}

fn replay_fixture(transport: &mut TestTransport) -> ReplaySummary {
    let path = fixture("session.jsonl");
    let file = File::open(&path).unwrap();
    replay(BufReader::new(file), &path, transport).unwrap()
}

fn levels_on(renderer: &Rc<RefCell<Renderer>>, surface: &str) -> Vec<String> {
    renderer
        .borrow()
        .surface(surface)
        .unwrap()
        .fragments()
        .iter()
        .map(|f| f.level.clone())
        .collect()
}

// =============================================================================
// Replay of a captured session
// =============================================================================

/// Every record of the capture lands on the surface in receipt order, with
/// object-form, integer and missing levels resolved.
#[test]
fn e2e_replay_fixture_in_receipt_order() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    let summary = replay_fixture(&mut transport);

    assert_eq!(
        summary,
        ReplaySummary {
            lines: 7,
            records: 7,
            rejected: 1
        }
    );
    assert_eq!(
        levels_on(&renderer, "logElement"),
        vec!["INFO", "WARN", "ERROR", "WARNING", "FINE", "ERROR", "UNKNOWN", "SEVERE"]
    );
}

/// The malformed line is shown as a local ERROR entry at its position.
#[test]
fn e2e_malformed_line_becomes_local_error() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    replay_fixture(&mut transport);

    let r = renderer.borrow();
    let fragment = &r.surface("logElement").unwrap().fragments()[5];
    assert_eq!(fragment.level, "ERROR");
    assert!(fragment.message.starts_with("Unreadable log payload"));
}

/// Console mirroring picks the method by level.
#[test]
fn e2e_console_methods_follow_levels() {
    let (mut transport, _) = make_viewer(&["logElement"], TransportConfig::default());
    replay_fixture(&mut transport);

    let methods: Vec<_> = transport.console().lines().iter().map(|(m, _)| *m).collect();
    assert_eq!(
        methods,
        vec![
            ConsoleMethod::Info,
            ConsoleMethod::Warn,
            ConsoleMethod::Error,
            ConsoleMethod::Warn,
            ConsoleMethod::Log,
            ConsoleMethod::Error,
            ConsoleMethod::Log,
            ConsoleMethod::Error,
        ]
    );
    assert_eq!(transport.console().lines()[0].1, "INFO : Server started");
}

// =============================================================================
// Surface operations
// =============================================================================

/// Filtering "disk" shows exactly the disk-related messages, highlighted.
#[test]
fn e2e_filter_highlights_matches() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    replay_fixture(&mut transport);
    renderer.borrow_mut().filter("logElement", "disk").unwrap();

    let r = renderer.borrow();
    let surface = r.surface("logElement").unwrap();
    let shown: Vec<_> = surface.displayed().map(|f| f.message.as_str()).collect();
    assert_eq!(
        shown,
        vec!["Disk usage at 91%", "Disk full", "Disk read error on /dev/sda"]
    );

    let markup = html::render_fragments(surface);
    assert_eq!(markup.matches("<mark>Disk</mark>").count(), 3);
}

/// Records arriving after a filter is set are filtered on arrival.
#[test]
fn e2e_filter_applies_to_later_records() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    renderer.borrow_mut().filter("logElement", "full").unwrap();
    replay_fixture(&mut transport);

    let r = renderer.borrow();
    let shown: Vec<_> = r
        .surface("logElement")
        .unwrap()
        .displayed()
        .map(|f| f.message.clone())
        .collect();
    assert_eq!(shown, vec!["Disk full"]);
}

/// An invalid regex is matched literally.
#[test]
fn e2e_invalid_regex_matches_literally() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    transport
        .receive(r#"[{"level":"INFO","message":"a (b"},{"level":"INFO","message":"ab"}]"#)
        .unwrap();
    renderer.borrow_mut().filter("logElement", "(b").unwrap();

    let r = renderer.borrow();
    let shown: Vec<_> = r
        .surface("logElement")
        .unwrap()
        .displayed()
        .map(|f| f.message.clone())
        .collect();
    assert_eq!(shown, vec!["a (b"]);
}

/// Hiding WARN keeps the fragments and hides them in the document.
#[test]
fn e2e_hidden_levels_in_document() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    replay_fixture(&mut transport);
    renderer
        .borrow_mut()
        .toggle_level_visible("logElement", "warn", true)
        .unwrap();

    let r = renderer.borrow();
    let surface = r.surface("logElement").unwrap();
    assert_eq!(surface.len(), 8);
    assert_eq!(surface.displayed().count(), 7);

    let doc = html::render_document(surface, "Session");
    assert!(doc.contains("class=\"logElement hide-warn\""));
    assert!(doc.contains(".hide-warn .level-warn { display: none; }"));
}

/// Clearing one surface leaves the other untouched.
#[test]
fn e2e_clear_is_per_surface() {
    let (mut transport, renderer) = make_viewer(&["main", "side"], TransportConfig::default());
    replay_fixture(&mut transport);
    renderer.borrow_mut().clear("main").unwrap();

    assert!(levels_on(&renderer, "main").is_empty());
    assert_eq!(levels_on(&renderer, "side").len(), 8);

    transport
        .receive(r#"{"level":"INFO","message":"after clear"}"#)
        .unwrap();
    assert_eq!(levels_on(&renderer, "main"), vec!["INFO"]);
}

/// Message text is escaped in the rendered document.
#[test]
fn e2e_markup_is_escaped() {
    let (mut transport, renderer) = make_viewer(&["logElement"], TransportConfig::default());
    replay_fixture(&mut transport);

    let r = renderer.borrow();
    let doc = html::render_document(r.surface("logElement").unwrap(), "Session");
    assert!(doc.contains("Cache miss for key &lt;user:42&gt;"));
    assert!(!doc.contains("<user:42>"));
}

// =============================================================================
// Outbound and lifecycle
// =============================================================================

/// Full lifecycle: handshake on open, outbound record, close.
#[test]
fn e2e_session_lifecycle() {
    let (mut transport, renderer) = make_viewer(
        &["logElement"],
        TransportConfig {
            send_session_handshake: true,
            session_id: Some("A1B2".to_string()),
        },
    );

    assert!(matches!(
        transport.send(&RawRecord::new("info", "too early")),
        Err(TransportError::NotConnected)
    ));

    let opened = transport.handle_event(ChannelEvent::Opened).unwrap();
    assert_eq!(
        opened,
        Dispatch::Lifecycle(LifecycleEvent::Opened {
            handshake_sent: true
        })
    );

    transport.report_error("Uncaught TypeError: x is undefined").unwrap();
    transport
        .handle_event(ChannelEvent::Closed {
            code: 1001,
            reason: "going away".to_string(),
        })
        .unwrap();

    let sent = transport.channel().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], r#"{"httpSessionId":"A1B2"}"#);
    let outbound: serde_json::Value = serde_json::from_str(&sent[1]).unwrap();
    assert_eq!(outbound["level"], "ERROR");
    assert_eq!(outbound["message"], "Uncaught TypeError: x is undefined");
    assert!(outbound["timestamp"].as_i64().unwrap() > 0);

    assert_eq!(levels_on(&renderer, "logElement"), vec!["INFO", "ERROR"]);
}

/// What goes out on the channel decodes to exactly the record shown locally.
#[test]
fn e2e_outbound_record_decodes_to_normalized_record() {
    let (mut transport, _) = make_viewer(&["logElement"], TransportConfig::default());
    transport.handle_event(ChannelEvent::Opened).unwrap();

    let sent_record = transport
        .send(&RawRecord::new("warning", "quota <90%> & rising"))
        .unwrap();
    let stamped = transport
        .send(&RawRecord::new("fine", "tick").with_timestamp(1_500_000_000_000))
        .unwrap();

    let sent = transport.channel().sent();
    assert_eq!(sent.len(), 2);
    let first: LogRecord = serde_json::from_str(&sent[0]).unwrap();
    let second: LogRecord = serde_json::from_str(&sent[1]).unwrap();
    assert_eq!(first, sent_record);
    assert_eq!(first.level, "WARNING");
    assert_eq!(second, stamped);
    assert_eq!(second.timestamp, 1_500_000_000_000);
}

/// A detached surface does not stop delivery to the others.
#[test]
fn e2e_detached_surface_isolated() {
    let (mut transport, renderer) = make_viewer(&["gone", "live"], TransportConfig::default());
    renderer.borrow_mut().detach("gone").unwrap();
    replay_fixture(&mut transport);

    assert!(levels_on(&renderer, "gone").is_empty());
    assert_eq!(levels_on(&renderer, "live").len(), 8);
}
