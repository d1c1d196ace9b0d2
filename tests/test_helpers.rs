//! Test helpers for integration tests
//!
//! [`MockStore`] is an in-process server speaking enough of the store's
//! protocol for the collector: PING, CONFIG GET/SET and PSUBSCRIBE. Tests
//! publish notifications, drop subscriber connections, flip the
//! replication role and make chosen commands fail through it.

#![allow(dead_code)]

use queue_scouter::config::CollectorSettings;
use queue_scouter::protocol::{RespValue, parse};
use queue_scouter::types::InstanceAddr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Pattern the collector subscribes to
pub const KEYSPACE_PATTERN: &str = "__keyspace@*";

#[derive(Debug, Default)]
struct MockState {
    config: Mutex<HashMap<String, String>>,
    subscribers: Mutex<Vec<UnboundedSender<Vec<u8>>>>,
    commands: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, Failure)>>,
    subscriptions: AtomicUsize,
    connections: AtomicUsize,
}

/// How a command matching a failure prefix misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Answer with an error reply, keeping the connection
    ErrorReply,
    /// Close the connection without answering
    HangUp,
}

/// In-process mock store instance
#[derive(Debug)]
pub struct MockStore {
    addr: InstanceAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockStore {
    /// Start a mock on an ephemeral local port
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(MockState::default());
        {
            let mut config = state.config.lock().unwrap();
            config.insert("notify-keyspace-events".to_string(), String::new());
            config.insert("slaveof".to_string(), String::new());
        }

        let accept_state = state.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_state.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, accept_state.clone()));
            }
        });

        Self {
            addr: format!("127.0.0.1:{}", port).parse().unwrap(),
            state,
            task,
        }
    }

    pub fn addr(&self) -> InstanceAddr {
        self.addr.clone()
    }

    pub fn set_config(&self, parameter: &str, value: &str) {
        self.state
            .config
            .lock()
            .unwrap()
            .insert(parameter.to_string(), value.to_string());
    }

    pub fn config(&self, parameter: &str) -> Option<String> {
        self.state.config.lock().unwrap().get(parameter).cloned()
    }

    /// Make the instance report itself as a replica of `upstream`
    pub fn demote(&self, upstream: &str) {
        self.set_config("slaveof", upstream);
    }

    pub fn promote(&self) {
        self.set_config("slaveof", "");
    }

    /// Deliver a key-space notification to every subscriber, returning how many got it
    pub fn publish(&self, channel: &str, payload: &str) -> usize {
        let frame = array(&[
            bulk("pmessage"),
            bulk(KEYSPACE_PATTERN),
            bulk(channel),
            bulk(payload),
        ]);
        let mut subscribers = self.state.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(frame.clone()).is_ok());
        subscribers.len()
    }

    /// Notification for a list operation on `queue` in database 0
    pub fn publish_op(&self, queue: &str, op: &str) -> usize {
        self.publish(&format!("__keyspace@0__:{}", queue), op)
    }

    /// Close every subscribed connection
    pub fn drop_subscribers(&self) {
        self.state.subscribers.lock().unwrap().clear();
    }

    /// Connections currently subscribed
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.state.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Answer commands starting with `prefix` with an error reply
    pub fn fail_command(&self, prefix: &str) {
        self.inject(prefix, Failure::ErrorReply);
    }

    /// Close the connection on commands starting with `prefix`
    pub fn hang_up_on(&self, prefix: &str) {
        self.inject(prefix, Failure::HangUp);
    }

    pub fn inject(&self, prefix: &str, failure: Failure) {
        self.state
            .failures
            .lock()
            .unwrap()
            .push((prefix.to_string(), failure));
    }

    /// Serve every command normally again
    pub fn clear_failures(&self) {
        self.state.failures.lock().unwrap().clear();
    }

    /// PSUBSCRIBE commands received so far
    pub fn subscriptions(&self) -> usize {
        self.state.subscriptions.load(Ordering::SeqCst)
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Received commands starting with `prefix`, e.g. `"CONFIG SET"`
    pub fn commands_matching(&self, prefix: &str) -> usize {
        self.state
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl Drop for MockStore {
    fn drop(&mut self) {
        self.task.abort();
        self.drop_subscribers();
    }
}

async fn next_published(subscription: &mut Option<UnboundedReceiver<Vec<u8>>>) -> Option<Vec<u8>> {
    match subscription {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn serve(mut stream: TcpStream, state: Arc<MockState>) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut subscription: Option<UnboundedReceiver<Vec<u8>>> = None;

    loop {
        while let Ok(Some((value, used))) = parse(&buffer) {
            buffer.drain(..used);
            let Some(reply) = handle(&state, &value, &mut subscription) else {
                return;
            };
            if stream.write_all(&reply).await.is_err() {
                return;
            }
        }

        tokio::select! {
            read = stream.read(&mut chunk) => match read {
                Ok(0) | Err(_) => return,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            },
            published = next_published(&mut subscription) => match published {
                Some(frame) => {
                    if stream.write_all(&frame).await.is_err() {
                        return;
                    }
                }
                // Dropped by the test
                None => return,
            },
        }
    }
}

fn handle(
    state: &MockState,
    value: &RespValue,
    subscription: &mut Option<UnboundedReceiver<Vec<u8>>>,
) -> Option<Vec<u8>> {
    let args: Vec<String> = value
        .as_array()
        .map(|items| items.iter().filter_map(RespValue::as_text).collect())
        .unwrap_or_default();
    let Some(name) = args.first().map(|a| a.to_ascii_uppercase()) else {
        return Some(b"-ERR empty command\r\n".to_vec());
    };
    let sub = args.get(1).map(|a| a.to_ascii_uppercase());

    let mut recorded = vec![name.clone()];
    recorded.extend(args.iter().skip(1).cloned());
    if let Some(s) = &sub {
        recorded[1] = s.clone();
    }
    let recorded = recorded.join(" ");
    state.commands.lock().unwrap().push(recorded.clone());

    let failure = state
        .failures
        .lock()
        .unwrap()
        .iter()
        .find(|(prefix, _)| recorded.starts_with(prefix.as_str()))
        .map(|(_, failure)| *failure);
    match failure {
        Some(Failure::HangUp) => return None,
        Some(Failure::ErrorReply) => {
            return Some(format!("-ERR injected failure for '{}'\r\n", name).into_bytes());
        }
        None => {}
    }

    let reply = match (name.as_str(), sub.as_deref(), args.len()) {
        ("PING", _, _) => b"+PONG\r\n".to_vec(),
        ("CONFIG", Some("GET"), 3) => {
            let config = state.config.lock().unwrap();
            match config.get(&args[2]) {
                Some(v) => array(&[bulk(&args[2]), bulk(v)]),
                None => b"*0\r\n".to_vec(),
            }
        }
        ("CONFIG", Some("SET"), 4) => {
            state
                .config
                .lock()
                .unwrap()
                .insert(args[2].clone(), args[3].clone());
            b"+OK\r\n".to_vec()
        }
        ("PSUBSCRIBE", _, 2) => {
            let (tx, rx) = mpsc::unbounded_channel();
            state.subscribers.lock().unwrap().push(tx);
            state.subscriptions.fetch_add(1, Ordering::SeqCst);
            *subscription = Some(rx);
            array(&[bulk("psubscribe"), bulk(&args[1]), b":1\r\n".to_vec()])
        }
        _ => format!("-ERR unknown command '{}'\r\n", name).into_bytes(),
    };
    Some(reply)
}

pub fn bulk(s: &str) -> Vec<u8> {
    format!("${}\r\n{}\r\n", s.len(), s).into_bytes()
}

pub fn array(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Collector timings short enough for tests
pub fn fast_settings() -> CollectorSettings {
    CollectorSettings {
        role_check_interval: Duration::from_millis(20),
        reconnect_delay: Duration::from_millis(50),
        idle_poll_interval: Duration::from_millis(20),
        configure_notifications: true,
    }
}

/// Poll `condition` until it holds, panicking after `timeout`
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A local address nothing listens on
pub async fn unused_addr() -> InstanceAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("127.0.0.1:{}", port).parse().unwrap()
}
