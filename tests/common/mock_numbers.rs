//! Mock numbers endpoint for testing remote keys.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Canned reply for one number.
#[derive(Debug, Clone)]
pub struct MockFact {
    pub status: u16,
    pub body: Vec<u8>,
    pub delay_ms: u64,
}

impl MockFact {
    pub fn text(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            delay_ms: 0,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

#[derive(Clone)]
struct MockState {
    facts: Arc<Mutex<HashMap<i64, MockFact>>>,
    requests: Arc<Mutex<Vec<i64>>>,
    hits: Arc<AtomicUsize>,
}

/// Numbers endpoint serving `GET /{n}` from a table of canned facts.
///
/// Unknown numbers answer `"{n} is a number."`.
pub struct MockNumbers {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockNumbers {
    pub async fn start() -> Self {
        let state = MockState {
            facts: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            hits: Arc::new(AtomicUsize::new(0)),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{number}", get(handle_fact))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub async fn set_fact(&self, number: i64, fact: MockFact) {
        self.state.facts.lock().await.insert(number, fact);
    }

    /// Numbers requested so far, in arrival order.
    pub async fn requests(&self) -> Vec<i64> {
        self.state.requests.lock().await.clone()
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockNumbers {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_fact(
    State(state): State<MockState>,
    Path(number): Path<i64>,
) -> (StatusCode, Vec<u8>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().await.push(number);

    let fact = state
        .facts
        .lock()
        .await
        .get(&number)
        .cloned()
        .unwrap_or_else(|| MockFact::text(&format!("{} is a number.", number)));

    if fact.delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(fact.delay_ms)).await;
    }

    (StatusCode::from_u16(fact.status).unwrap(), fact.body)
}
