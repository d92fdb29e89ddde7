//! Background axum server for the mock API.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

type SharedState = Arc<RwLock<MockState>>;

/// How long [`MockServer::shutdown`] waits for open connections to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Mock QuoIntelligence API on an ephemeral loopback port.
pub struct MockServer {
    url: String,
    state: SharedState,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Serve [`Fixtures::default_scenario`].
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario().into()).await
    }

    /// Serve no accounts and no data; every login is rejected.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    pub async fn with_state(state: MockState) -> Self {
        let state = state.shared();
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("mock server: no free loopback port");
        let addr = listener
            .local_addr()
            .expect("mock server: listener has no address");

        let (stop, stopped) = oneshot::channel::<()>();
        let app = router(Arc::clone(&state));
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stopped.await;
                })
                .await;
            if let Err(e) = served {
                tracing::warn!("mock server stopped with error: {}", e);
            }
        });

        Self {
            url: format!("http://{addr}"),
            state,
            stop,
            task,
        }
    }

    /// Base URL to hand to `ClientConfig::with_base_url`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Live server state; writes are visible to the next request.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Stop accepting connections and wait for the server task.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
            let _ = (&mut self.task).await;
        }
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/ticket/:id", get(handlers::get_ticket))
        .route("/catalogs/:name", get(handlers::get_catalog))
        .route("/health", get(|| async { "ok" }))
        // Collections last; static segments win over the capture
        .route("/:resource", get(handlers::list_collection))
        .with_state(state)
}
