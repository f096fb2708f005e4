use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    Figment,
    providers::{Format, Yaml},
};
use perceiver_metrics::config::{Config, ConfigV1};
use perceiver_metrics::metrics::Metrics;
use perceiver_metrics::routes::create_router;
use perceiver_metrics::state::AppState;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
bind_address: 127.0.0.1:9091
"#;

pub fn load_test_config() -> ConfigV1 {
    let config: Config = Figment::new()
        .merge(Yaml::string(TEST_CONFIG))
        .extract()
        .expect("Failed to parse test config YAML");

    match config {
        Config::ConfigV1(cfg) => cfg,
    }
}

/// Builds the router around `metrics`, returning both so tests can record and then scrape.
pub fn build_app_with(metrics: Metrics) -> (Router, Metrics) {
    let state = AppState {
        config: Arc::new(load_test_config()),
        metrics: metrics.clone(),
    };
    (create_router(state), metrics)
}

pub fn build_app() -> (Router, Metrics) {
    build_app_with(Metrics::new())
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}
