// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP client session for a standalone coordination service.
//!
//! One socket carries correlated request/reply traffic and server-pushed
//! watch events. A dedicated reader thread demuxes incoming frames: replies
//! are routed to the blocked caller by request id, events to the single-fire
//! watch table by path.

use super::protocol::{self, ReplyBody, Request, RequestOp, ServerFrame};
use super::{Coordination, EventSubscriber, NodeEvent, NodeMode, NodeStat};
use crate::config::CoordinationConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Synchronous coordination client over a framed TCP connection.
pub struct CoordinationSession {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CoordinationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationSession").finish_non_exhaustive()
    }
}

struct Shared {
    config: CoordinationConfig,
    writer: Mutex<TcpStream>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, SyncSender<ReplyBody>>>,
    watches: Mutex<HashMap<String, Vec<EventSubscriber>>>,
    running: AtomicBool,
}

impl CoordinationSession {
    /// Dial the configured endpoints in order and start the reader thread.
    pub fn connect(config: CoordinationConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        let stream = dial(&config)?;
        stream.set_nodelay(true).ok();
        let read_half = stream.try_clone()?;

        let shared = Arc::new(Shared {
            config,
            writer: Mutex::new(stream),
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            watches: Mutex::new(HashMap::new()),
            running: AtomicBool::new(true),
        });

        let reader_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("emberq-coord-reader".to_string())
            .spawn(move || reader_loop(read_half, &reader_shared))
            .map_err(Error::Io)?;

        Ok(Self {
            shared,
            reader: Mutex::new(Some(handle)),
        })
    }

    /// Check if the session is still connected.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed)
    }
}

impl Shared {
    fn request(&self, op: RequestOp) -> Result<ReplyBody> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(Error::SessionClosed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = sync_channel(1);
        self.pending.lock().insert(id, tx);

        let frame = match protocol::encode_frame(&Request { id, op }, self.config.max_frame_size) {
            Ok(f) => f,
            Err(e) => {
                self.pending.lock().remove(&id);
                return Err(e);
            }
        };
        {
            let mut writer = self.writer.lock();
            if let Err(e) = writer.write_all(&frame).and_then(|()| writer.flush()) {
                self.pending.lock().remove(&id);
                return Err(Error::Io(e));
            }
        }

        match rx.recv_timeout(self.config.connect_timeout) {
            Ok(ReplyBody::Error { code, message }) => Err(protocol::error_from_reply(code, message)),
            Ok(body) => Ok(body),
            Err(RecvTimeoutError::Timeout) => {
                self.pending.lock().remove(&id);
                Err(Error::Timeout(format!("request {}", id)))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::SessionClosed),
        }
    }

    // Registered before the request goes out so an event racing the reply
    // still finds its channel.
    fn arm(&self, path: &str, watch: Option<&EventSubscriber>) {
        if let Some(sub) = watch {
            self.watches
                .lock()
                .entry(path.to_string())
                .or_default()
                .push(sub.clone());
        }
    }
}

fn dial(config: &CoordinationConfig) -> Result<TcpStream> {
    let mut last_err = String::from("no endpoints");
    for endpoint in &config.endpoints {
        let addrs = match endpoint.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                last_err = format!("{}: {}", endpoint, e);
                continue;
            }
        };
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, config.connect_timeout) {
                Ok(stream) => {
                    log::info!("[COORD] connected to {}", endpoint);
                    return Ok(stream);
                }
                Err(e) => last_err = format!("{}: {}", endpoint, e),
            }
        }
        log::warn!("[COORD] endpoint {} unreachable", endpoint);
    }
    Err(Error::Connection(last_err))
}

fn reader_loop(mut stream: TcpStream, shared: &Shared) {
    while shared.running.load(Ordering::Relaxed) {
        let frame = match read_frame(&mut stream, shared.config.max_frame_size) {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                if shared.running.load(Ordering::Relaxed) {
                    log::warn!("[COORD] reader failed: {}", e);
                }
                break;
            }
        };
        match protocol::decode_frame::<ServerFrame>(&frame) {
            Ok(ServerFrame::Reply { id, body }) => {
                let waiter = shared.pending.lock().remove(&id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(body);
                    }
                    None => log::warn!("[COORD] unmatched reply id {}", id),
                }
            }
            Ok(ServerFrame::Event { path, kind }) => {
                let armed = shared.watches.lock().remove(&path);
                for sub in armed.into_iter().flatten() {
                    sub.deliver(NodeEvent {
                        path: path.clone(),
                        kind,
                    });
                }
            }
            Err(e) => log::warn!("[COORD] bad frame: {}", e),
        }
    }
    shared.running.store(false, Ordering::Relaxed);
    // Dropping the senders fails every in-flight request over to SessionClosed.
    shared.pending.lock().clear();
    log::info!("[COORD] reader stopped");
}

fn read_frame(stream: &mut TcpStream, max_frame_size: usize) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len == 0 || len > max_frame_size {
        return Err(Error::Protocol(format!("invalid frame length: {}", len)));
    }
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(Some(buf))
}

fn unexpected(body: ReplyBody) -> Error {
    Error::Protocol(format!("unexpected reply: {:?}", body))
}

impl Coordination for CoordinationSession {
    fn exists(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<bool> {
        self.shared.arm(path, watch);
        match self.shared.request(RequestOp::Exists {
            path: path.to_string(),
            watch: watch.is_some(),
        })? {
            ReplyBody::Exists { exists } => Ok(exists),
            other => Err(unexpected(other)),
        }
    }

    fn create(&self, path: &str, data: &[u8], mode: NodeMode) -> Result<String> {
        match self.shared.request(RequestOp::Create {
            path: path.to_string(),
            data: protocol::to_hex(data),
            mode,
        })? {
            ReplyBody::Created { path } => Ok(path),
            other => Err(unexpected(other)),
        }
    }

    fn set_data(&self, path: &str, data: &[u8], version: i32) -> Result<NodeStat> {
        match self.shared.request(RequestOp::SetData {
            path: path.to_string(),
            data: protocol::to_hex(data),
            version,
        })? {
            ReplyBody::Stat { version } => Ok(NodeStat { version }),
            other => Err(unexpected(other)),
        }
    }

    fn get_data(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<u8>> {
        self.shared.arm(path, watch);
        match self.shared.request(RequestOp::GetData {
            path: path.to_string(),
            watch: watch.is_some(),
        })? {
            ReplyBody::Data { data } => protocol::from_hex(&data)
                .ok_or_else(|| Error::Protocol("invalid hex payload".to_string())),
            other => Err(unexpected(other)),
        }
    }

    fn children(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<String>> {
        self.shared.arm(path, watch);
        match self.shared.request(RequestOp::Children {
            path: path.to_string(),
            watch: watch.is_some(),
        })? {
            ReplyBody::Children { children } => Ok(children),
            other => Err(unexpected(other)),
        }
    }

    fn close(&self) {
        if !self.shared.running.load(Ordering::Relaxed) {
            return;
        }
        let _ = self.shared.request(RequestOp::Close);
        self.shared.running.store(false, Ordering::Relaxed);
        let _ = self.shared.writer.lock().shutdown(Shutdown::Both);
        if let Some(handle) = self.reader.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CoordinationSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::event_channel;
    use crate::coordination::NodeEventKind;
    use std::net::TcpListener;
    use std::time::Duration;

    fn test_config(port: u16) -> CoordinationConfig {
        CoordinationConfig::from_endpoint_list(&format!("127.0.0.1:{}", port))
            .with_connect_timeout(Duration::from_millis(500))
    }

    fn read_test_frame(stream: &mut TcpStream) -> Vec<u8> {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).unwrap();
        let mut buf = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        stream.read_exact(&mut buf).unwrap();
        buf
    }

    fn send_test_frame<T: serde::Serialize>(stream: &mut TcpStream, msg: &T) {
        let frame = protocol::encode_frame(msg, 1 << 20).unwrap();
        stream.write_all(&frame).unwrap();
        stream.flush().unwrap();
    }

    #[test]
    fn test_connect_failure() {
        let config = CoordinationConfig::from_endpoint_list("127.0.0.1:1")
            .with_connect_timeout(Duration::from_millis(200));
        let err = CoordinationSession::connect(config).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_request_reply_and_pushed_event() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let frame = read_test_frame(&mut stream);
            let req: Request = protocol::decode_frame(&frame).unwrap();
            assert!(matches!(req.op, RequestOp::Exists { .. }));

            send_test_frame(
                &mut stream,
                &ServerFrame::Reply {
                    id: req.id,
                    body: ReplyBody::Exists { exists: true },
                },
            );
            send_test_frame(
                &mut stream,
                &ServerFrame::Event {
                    path: "/emberq/server/trade".to_string(),
                    kind: NodeEventKind::Created,
                },
            );
        });

        let session = CoordinationSession::connect(test_config(port)).unwrap();
        let (sub, rx) = event_channel();
        assert!(session.exists("/emberq/server/trade", Some(&sub)).unwrap());

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.path, "/emberq/server/trade");
        assert_eq!(event.kind, NodeEventKind::Created);

        server.join().unwrap();
    }

    #[test]
    fn test_error_reply_is_mapped() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let frame = read_test_frame(&mut stream);
            let req: Request = protocol::decode_frame(&frame).unwrap();
            send_test_frame(
                &mut stream,
                &ServerFrame::Reply {
                    id: req.id,
                    body: ReplyBody::Error {
                        code: protocol::ErrorCode::NoNode,
                        message: "/emberq/missing".to_string(),
                    },
                },
            );
        });

        let session = CoordinationSession::connect(test_config(port)).unwrap();
        let err = session.get_data("/emberq/missing", None).unwrap_err();
        assert!(matches!(err, Error::NoNode(_)));

        server.join().unwrap();
    }

    #[test]
    fn test_request_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and go silent.
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(600));
            drop(stream);
        });

        let session = CoordinationSession::connect(test_config(port)).unwrap();
        let err = session.exists("/emberq", None).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        server.join().unwrap();
    }
}
