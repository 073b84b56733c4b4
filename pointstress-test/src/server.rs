//! An in-process stub of the points service for integration tests.
//!
//! ```no_run
//! use pointstress_test::server::StubServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = StubServer::start().await;
//!     let url = server.url();
//!     // point the load generator at the URL...
//! }
//! ```

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Semaphore;

/// The reset token the stub accepts.
pub const RESET_TOKEN: &str = "Reset-Force";

/// Balance every provisioned participant starts with.
const INITIAL_BALANCE: i64 = 1_000_000;

/// Shared state of the stub service, inspectable from tests.
#[derive(Debug)]
pub struct StubState {
    balances: Mutex<HashMap<String, i64>>,

    /// Total number of `POST /send` calls observed.
    pub send_calls: AtomicU64,
    /// Total number of `GET /user/{name}/log` calls observed.
    pub history_calls: AtomicU64,
    /// Total number of `GET /user/{name}` calls observed.
    pub state_calls: AtomicU64,

    fail_sends: AtomicU64,
    reject_provisioning: AtomicBool,
    fail_state_probes: AtomicBool,
    sever_state_probes: AtomicBool,

    held_sends: AtomicU64,
    parked_sends: AtomicU64,
    gate: Semaphore,
}

impl StubState {
    fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            send_calls: AtomicU64::new(0),
            history_calls: AtomicU64::new(0),
            state_calls: AtomicU64::new(0),
            fail_sends: AtomicU64::new(0),
            reject_provisioning: AtomicBool::new(false),
            fail_state_probes: AtomicBool::new(false),
            sever_state_probes: AtomicBool::new(false),
            held_sends: AtomicU64::new(0),
            parked_sends: AtomicU64::new(0),
            gate: Semaphore::new(0),
        }
    }

    /// The next `n` send calls answer 500, later ones succeed.
    pub fn fail_first_sends(&self, n: u64) {
        self.fail_sends.store(n, Ordering::SeqCst);
    }

    /// All further provisioning calls answer 500.
    pub fn reject_provisioning(&self) {
        self.reject_provisioning.store(true, Ordering::SeqCst);
    }

    /// All further state probes answer 500 (with a body, the
    /// connection stays intact).
    pub fn fail_state_probes(&self) {
        self.fail_state_probes.store(true, Ordering::SeqCst);
    }

    /// All further state probes tear down the connection mid-request,
    /// which the client observes as a transport error.
    pub fn sever_state_probes(&self) {
        self.sever_state_probes.store(true, Ordering::SeqCst);
    }

    /// Parks the next `n` send calls until [`release_sends`](Self::release_sends).
    pub fn hold_next_sends(&self, n: u64) {
        self.held_sends.store(n, Ordering::SeqCst);
    }

    /// Number of send calls currently parked.
    pub fn parked_sends(&self) -> u64 {
        self.parked_sends.load(Ordering::SeqCst)
    }

    /// Releases up to `n` parked send calls.
    pub fn release_sends(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Current balance of a participant, if provisioned.
    pub fn balance(&self, name: &str) -> Option<i64> {
        self.balances.lock().unwrap().get(name).copied()
    }

    /// Number of provisioned participants.
    pub fn participant_count(&self) -> usize {
        self.balances.lock().unwrap().len()
    }

    fn take(counter: &AtomicU64) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// An in-process stub points service listening on a random port.
///
/// The server is aborted when dropped. Its [`StubState`] stays
/// shared, so tests can flip failure knobs and inspect call counters
/// while the load generator is running.
#[derive(Debug)]
pub struct StubServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    /// The shared, inspectable stub state.
    pub state: Arc<StubState>,
}

impl StubServer {
    /// Starts the stub on a random localhost port.
    pub async fn start() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = Arc::new(StubState::new());
        let router = router(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns the base URL of the stub.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.socket.port())
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/reset", routing::delete(reset))
        .route("/user/{name}", routing::post(create_user).get(get_user))
        .route("/user/{name}/log", routing::get(get_history))
        .route("/send/{from}/{to}", routing::post(send))
        .with_state(state)
}

async fn reset(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let token = headers.get("Authentication").map(|value| value.as_bytes());
    if token != Some(RESET_TOKEN.as_bytes()) {
        return (StatusCode::UNAUTHORIZED, "bad reset token").into_response();
    }
    state.balances.lock().unwrap().clear();
    StatusCode::OK.into_response()
}

async fn create_user(State(state): State<Arc<StubState>>, Path(name): Path<String>) -> Response {
    if state.reject_provisioning.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "provisioning disabled").into_response();
    }
    state
        .balances
        .lock()
        .unwrap()
        .insert(name, INITIAL_BALANCE);
    StatusCode::CREATED.into_response()
}

async fn get_user(State(state): State<Arc<StubState>>, Path(name): Path<String>) -> Response {
    state.state_calls.fetch_add(1, Ordering::SeqCst);
    if state.sever_state_probes.load(Ordering::SeqCst) {
        // The panic kills the connection task, so the client sees the
        // connection close without a response.
        panic!("injected probe connection failure");
    }
    if state.fail_state_probes.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "probe disabled").into_response();
    }
    match state.balance(&name) {
        Some(balance) => (StatusCode::OK, balance.to_string()).into_response(),
        None => (StatusCode::NOT_FOUND, "no such user").into_response(),
    }
}

async fn get_history(State(state): State<Arc<StubState>>, Path(name): Path<String>) -> Response {
    state.history_calls.fetch_add(1, Ordering::SeqCst);
    if !state.balances.lock().unwrap().contains_key(&name) {
        return (StatusCode::NOT_FOUND, "no such user").into_response();
    }
    (StatusCode::OK, "[]").into_response()
}

#[derive(Debug, Deserialize)]
struct SendBody {
    point: i64,
}

async fn send(
    State(state): State<Arc<StubState>>,
    Path((from, to)): Path<(String, String)>,
    Json(body): Json<SendBody>,
) -> Response {
    state.send_calls.fetch_add(1, Ordering::SeqCst);

    if StubState::take(&state.held_sends) {
        state.parked_sends.fetch_add(1, Ordering::SeqCst);
        let permit = state.gate.acquire().await.unwrap();
        permit.forget();
        state.parked_sends.fetch_sub(1, Ordering::SeqCst);
    }

    if StubState::take(&state.fail_sends) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response();
    }

    let mut balances = state.balances.lock().unwrap();
    if !balances.contains_key(&from) || !balances.contains_key(&to) {
        return (StatusCode::NOT_FOUND, "no such user").into_response();
    }
    *balances.get_mut(&from).unwrap() -= body.point;
    *balances.get_mut(&to).unwrap() += body.point;
    StatusCode::OK.into_response()
}
