//! In-process stand-in for the backend, used by unit tests.

#![allow(clippy::unwrap_used)]

use axum::Router;

use super::BackendClient;
use crate::config::BackendConfig;

/// Serve `router` on a random local port and return a client pointed at it.
pub async fn spawn_backend(router: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    BackendClient::new(&BackendConfig {
        url: format!("http://{addr}"),
        anon_key: "test-anon-key".to_string(),
        service_key: None,
    })
}
