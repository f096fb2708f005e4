use std::sync::Arc;

use perceiver_metrics::config::{load_config, print_schema};
use perceiver_metrics::startup;
use perceiver_metrics::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging);

    // Declaration errors abort here, before anything can record.
    let state = startup::build_state(config);

    if let Err(e) = startup::run(state).await {
        error!("Metrics server stopped: {}", e);
        std::process::exit(1);
    }
}
