use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::fixtures::ApiFixture;
use crate::handlers::{
    get_device, health_check, list_devices, lock_door, require_api_key, unlock_door, AppState,
    SharedState,
};

pub struct FakeApiServer {
    state: SharedState,
}

impl FakeApiServer {
    pub fn new(fixture: ApiFixture, api_key: impl Into<String>) -> Self {
        Self {
            state: Arc::new(AppState {
                api_key: api_key.into(),
                fixture: RwLock::new(fixture),
            }),
        }
    }

    pub fn router(&self) -> Router {
        let authenticated = Router::new()
            .route("/devices/list", get(list_devices).post(list_devices))
            .route("/devices/get", post(get_device))
            .route("/locks/lock_door", post(lock_door))
            .route("/locks/unlock_door", post(unlock_door))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                require_api_key,
            ));

        Router::new()
            .route("/health", get(health_check))
            .merge(authenticated)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Binds `bind_addr` (port 0 picks a free port) and serves in the
    /// background. The returned URL uses `advertised_host`, the name under
    /// which sandboxed snippets reach this machine.
    pub async fn start(self, bind_addr: &str, advertised_host: &str) -> anyhow::Result<RunningServer> {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let base_url = format!("http://{}:{}", advertised_host, local_addr.port());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = self.router();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // Fires on an explicit send or when the sender is dropped.
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!("Fake API listening on {} (advertised as {})", local_addr, base_url);

        Ok(RunningServer {
            base_url,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }
}

/// Handle to a background server. Dropping it stops the server as well.
pub struct RunningServer {
    base_url: String,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        (&mut self.task).await??;
        tracing::info!("Fake API at {} stopped", self.base_url);
        Ok(())
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
