// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::module_name_repetitions)] // Test modules

//! Registry-layer integration tests over the in-memory coordination backend.

use emberq_registry::{
    Binding, Coordination, MemoryCoordination, NodeEventKind, NodeMode, RegistryClient,
    WatchSession, Watcher,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct RecordingWatcher {
    events: Mutex<Vec<(String, NodeEventKind, Option<Vec<Binding>>)>>,
    children: Mutex<Vec<(String, Vec<String>)>>,
}

impl Watcher for RecordingWatcher {
    fn event_notify(&self, path: &str, kind: NodeEventKind, bindings: Option<Vec<Binding>>) {
        self.events.lock().push((path.to_string(), kind, bindings));
    }

    fn child_watcher(&self, path: &str, children: Vec<String>) {
        self.children.lock().push((path.to_string(), children));
    }
}

fn wait_until(deadline_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(deadline_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn setup() -> (Arc<MemoryCoordination>, RegistryClient) {
    let coord = Arc::new(MemoryCoordination::new());
    let registry = RegistryClient::new(coord.clone()).expect("root bootstrap");
    (coord, registry)
}

#[test]
fn absent_topic_query_is_empty_success() {
    let (_coord, registry) = setup();
    let mut session = WatchSession::new(Arc::new(RecordingWatcher::default()));

    let servers = registry
        .discovery()
        .servers_and_watch("unknown-topic", &mut session)
        .expect("absent topic is not an error");

    assert!(servers.is_empty());
    // No children fetch happened, so the dispatch task was never started.
    assert!(!session.is_running());
}

#[test]
fn absent_topic_existence_watch_observes_creation() {
    let (coord, registry) = setup();
    let watcher = Arc::new(RecordingWatcher::default());
    let mut session = WatchSession::new(watcher.clone());

    let servers = registry
        .discovery()
        .servers_and_watch("trade", &mut session)
        .unwrap();
    assert!(servers.is_empty());

    // The query armed an existence watch even though it declined to start
    // dispatch; start it manually and create the topic.
    session
        .start_dispatch(coord.clone(), "/emberq/server/trade")
        .unwrap();
    registry
        .presence()
        .publish_server_presence("10.0.0.7:13800", &["trade".into()])
        .unwrap();

    assert!(wait_until(2000, || watcher
        .events
        .lock()
        .iter()
        .any(|(path, kind, _)| path == "/emberq/server/trade"
            && *kind == NodeEventKind::Created)));
}

#[test]
fn server_discovery_returns_snapshot_and_watches_joins() {
    let (_coord, registry) = setup();
    registry
        .presence()
        .publish_server_presence("10.0.0.7:13800", &["trade".into()])
        .unwrap();

    let watcher = Arc::new(RecordingWatcher::default());
    let mut session = WatchSession::new(watcher.clone());

    let servers = registry
        .discovery()
        .servers_and_watch("trade", &mut session)
        .unwrap();
    assert_eq!(servers, vec!["10.0.0.7:13800".to_string()]);
    assert!(session.is_running());

    // A second server joins; the child watch reports the fresh listing.
    registry
        .presence()
        .publish_server_presence("10.0.0.8:13800", &["trade".into()])
        .unwrap();

    assert!(wait_until(2000, || {
        watcher
            .children
            .lock()
            .iter()
            .any(|(path, children)| path == "/emberq/server/trade" && children.len() == 2)
    }));
}

#[test]
fn binding_discovery_aggregates_groups() {
    let (_coord, registry) = setup();
    registry
        .bindings()
        .publish_bindings(
            "g-settle",
            vec![
                Binding::new("trade", "", "r1", true),
                Binding::new("trade", "", "r2", true),
            ],
        )
        .unwrap();
    registry
        .bindings()
        .publish_bindings("g-audit", vec![Binding::new("trade", "", "r3", true)])
        .unwrap();

    let mut session = WatchSession::new(Arc::new(RecordingWatcher::default()));
    let mut bindings = registry
        .discovery()
        .bindings_and_watch("trade", &mut session)
        .unwrap();

    bindings.sort_by(|a, b| a.rule.cmp(&b.rule));
    let rules: Vec<_> = bindings.iter().map(|b| b.rule.as_str()).collect();
    assert_eq!(rules, vec!["r1", "r2", "r3"]);
    assert!(bindings
        .iter()
        .filter(|b| b.group_id == "g-settle")
        .count() == 2);
}

#[test]
fn corrupt_group_payload_is_omitted_not_fatal() {
    let (coord, registry) = setup();
    registry
        .bindings()
        .publish_bindings("g1", vec![Binding::new("trade", "", "good", true)])
        .unwrap();
    // A second group with a corrupt payload, written behind the codec's back.
    coord
        .create(
            "/emberq/sub/trade/g2-bind",
            b"corrupt payload",
            NodeMode::Persistent,
        )
        .unwrap();

    let mut session = WatchSession::new(Arc::new(RecordingWatcher::default()));
    let bindings = registry
        .discovery()
        .bindings_and_watch("trade", &mut session)
        .unwrap();

    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].rule, "good");
    assert_eq!(bindings[0].group_id, "g1");
}

#[test]
fn republished_bindings_reach_the_watcher() {
    let (_coord, registry) = setup();
    registry
        .bindings()
        .publish_bindings("g1", vec![Binding::new("trade", "", "old", true)])
        .unwrap();

    let watcher = Arc::new(RecordingWatcher::default());
    let mut session = WatchSession::new(watcher.clone());
    registry
        .discovery()
        .bindings_and_watch("trade", &mut session)
        .unwrap();

    registry
        .bindings()
        .publish_bindings("g1", vec![Binding::new("trade", "", "new", true)])
        .unwrap();

    assert!(wait_until(2000, || {
        watcher.events.lock().iter().any(|(path, kind, bindings)| {
            path == "/emberq/sub/trade/g1-bind"
                && *kind == NodeEventKind::Changed
                && bindings
                    .as_ref()
                    .is_some_and(|b| b.iter().any(|bind| bind.rule == "new"))
        })
    }));
}

#[test]
fn server_departure_is_observed() {
    let (coord, registry) = setup();
    registry
        .presence()
        .publish_server_presence("10.0.0.7:13800", &["trade".into()])
        .unwrap();

    let watcher = Arc::new(RecordingWatcher::default());
    let mut session = WatchSession::new(watcher.clone());
    registry
        .discovery()
        .servers_and_watch("trade", &mut session)
        .unwrap();

    // Session drop releases the ephemeral presence node.
    coord.close();

    assert!(wait_until(2000, || {
        watcher
            .children
            .lock()
            .iter()
            .any(|(path, children)| path == "/emberq/server/trade" && children.is_empty())
    }));
}
