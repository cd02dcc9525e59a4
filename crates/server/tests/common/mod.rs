//! Common test utilities for router tests with mock backends.
//!
//! The fixture builds the real router around a `SearchCoordinator` whose
//! backends are `MockBackend`s, so requests travel the whole search path
//! without touching the network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use torrsearch_core::{
    testing::MockBackend, Backend, Config, SearchCoordinator, SearchOptions, ServerConfig,
};

/// Re-export fixtures for test convenience
pub use torrsearch_core::testing::fixtures;

/// Test fixture with three mock backends named after the real ones.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub rutor: Arc<MockBackend>,
    pub yohoho: Arc<MockBackend>,
    pub tparser: Arc<MockBackend>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default options and a short backend timeout.
    pub fn new() -> Self {
        Self::with_options(SearchOptions {
            backend_timeout: Some(Duration::from_millis(300)),
            ..Default::default()
        })
    }

    pub fn with_options(options: SearchOptions) -> Self {
        let rutor = Arc::new(MockBackend::new("rutor"));
        let yohoho = Arc::new(MockBackend::new("yohoho"));
        let tparser = Arc::new(MockBackend::new("tparser"));

        let backends: Vec<Arc<dyn Backend>> = vec![
            Arc::clone(&rutor) as Arc<dyn Backend>,
            Arc::clone(&yohoho) as Arc<dyn Backend>,
            Arc::clone(&tparser) as Arc<dyn Backend>,
        ];

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            ..Default::default()
        };

        let coordinator = Arc::new(SearchCoordinator::new(backends, options));
        let state = Arc::new(torrsearch_server::state::AppState::new(config, coordinator));
        let router = torrsearch_server::api::create_router(state);

        Self {
            router,
            rutor,
            yohoho,
            tparser,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
