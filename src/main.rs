use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use plantai::{
    build_app,
    utils::{init_tracing, shutdown_signal},
    AppState, Config, Model,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let model = Model::new();
    tracing::info!(labels = ?model.labels().collect::<Vec<_>>(), "mock model ready");

    let shared_state = Arc::new(AppState::new(model, config.predict_delay));
    let app = build_app(shared_state, config.body_limit_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = match axum::Server::try_bind(&addr) {
        Ok(builder) => builder,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        %addr,
        body_limit_bytes = config.body_limit_bytes,
        predict_delay_ms = config.predict_delay.as_millis() as u64,
        "listening"
    );

    if let Err(err) = server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
