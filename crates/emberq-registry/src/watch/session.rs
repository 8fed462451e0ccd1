// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-path watch session and its dispatch loop.

use super::Watcher;
use crate::binding::{decode_bindings, Binding};
use crate::coordination::{
    event_channel, Coordination, EventSubscriber, NodeEvent, NodeEventKind,
};
use crate::error::{Error, Result};
use crate::registry::is_binding_leaf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the dispatch loop wakes to check its stop token.
const DISPATCH_POLL: Duration = Duration::from_millis(100);

/// One logically watched path: a bounded event channel, its callback, and
/// the dispatch task that classifies and re-arms.
///
/// The session owns its dispatch thread. `stop()` (or drop) signals the stop
/// token and joins the thread, so abandoned sessions do not leak.
pub struct WatchSession {
    callback: Arc<dyn Watcher>,
    subscriber: EventSubscriber,
    receiver: Option<Receiver<NodeEvent>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatchSession {
    /// Create a session delivering classified events to `callback`.
    pub fn new(callback: Arc<dyn Watcher>) -> Self {
        let (subscriber, receiver) = event_channel();
        Self {
            callback,
            subscriber,
            receiver: Some(receiver),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Sender half used to arm watches on behalf of this session.
    pub fn subscriber(&self) -> EventSubscriber {
        self.subscriber.clone()
    }

    /// Whether the dispatch task is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the dispatch task for `path`. Only one task per session; the
    /// task is the sole reader of the event channel.
    pub fn start_dispatch(&mut self, coord: Arc<dyn Coordination>, path: &str) -> Result<()> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| Error::AlreadyDispatching(path.to_string()))?;

        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let callback = Arc::clone(&self.callback);
        let subscriber = self.subscriber.clone();
        let target = path.to_string();

        let handle = thread::Builder::new()
            .name(format!("emberq-watch{}", target.replace('/', "-")))
            .spawn(move || {
                dispatch_loop(&coord, &target, &receiver, &*callback, &subscriber, &running);
            })
            .map_err(Error::Io)?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Signal the dispatch task to stop and join it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch_loop(
    coord: &Arc<dyn Coordination>,
    target: &str,
    receiver: &Receiver<NodeEvent>,
    callback: &dyn Watcher,
    subscriber: &EventSubscriber,
    running: &AtomicBool,
) {
    log::debug!("[WATCH] dispatch started for {}", target);
    while running.load(Ordering::Relaxed) {
        let event = match receiver.recv_timeout(DISPATCH_POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match event.kind {
            NodeEventKind::Created | NodeEventKind::Deleted => {
                rearm_exists(coord.as_ref(), &event.path, subscriber);
                callback.event_notify(&event.path, event.kind, None);
            }
            NodeEventKind::Changed => {
                // Data changes below the binding leaves are structural noise.
                if !is_binding_leaf(&event.path) {
                    rearm_exists(coord.as_ref(), &event.path, subscriber);
                    continue;
                }
                match fetch_bindings(coord.as_ref(), &event.path, subscriber) {
                    Ok(bindings) => {
                        callback.event_notify(&event.path, NodeEventKind::Changed, Some(bindings));
                    }
                    Err(e) => {
                        log::warn!("[WATCH] binding fetch failed for {}: {}", event.path, e);
                    }
                }
            }
            NodeEventKind::ChildSetChanged => {
                match coord.children(&event.path, Some(subscriber)) {
                    Ok(children) => {
                        log::info!("[WATCH] child set changed at {}: {:?}", event.path, children);
                        callback.child_watcher(&event.path, children);
                    }
                    Err(e) => {
                        log::warn!("[WATCH] children fetch failed for {}: {}", event.path, e);
                    }
                }
            }
        }
    }
    log::debug!("[WATCH] dispatch stopped for {}", target);
}

fn rearm_exists(coord: &dyn Coordination, path: &str, subscriber: &EventSubscriber) {
    if let Err(e) = coord.exists(path, Some(subscriber)) {
        log::warn!("[WATCH] exists re-arm failed for {}: {}", path, e);
    }
}

/// Read and decode a binding leaf; the read re-arms the data watch.
pub(crate) fn fetch_bindings(
    coord: &dyn Coordination,
    path: &str,
    subscriber: &EventSubscriber,
) -> Result<Vec<Binding>> {
    let data = coord.get_data(path, Some(subscriber))?;
    decode_bindings(&data)
}
