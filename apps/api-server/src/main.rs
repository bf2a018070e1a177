//! # Ephemeral Wall API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;
#[cfg(feature = "websocket")]
mod websocket;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Ephemeral Wall API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;

    #[cfg(feature = "websocket")]
    {
        let (host, port, pubsub) = (config.host.clone(), config.ws_port, state.pubsub.clone());
        tokio::spawn(async move {
            if let Err(e) = websocket::serve(host, port, pubsub).await {
                tracing::error!(error = %e, "Socket.io bridge stopped");
            }
        });
    }

    #[cfg(feature = "scheduler")]
    let expiry_sweep = start_scheduler(&config, &state).await;

    #[cfg(not(feature = "scheduler"))]
    if config.expiry_sweep_cron.is_some() {
        tracing::warn!("EXPIRY_SWEEP_CRON set but scheduler feature disabled");
    }

    let served = HttpServer::new(move || {
        let app = App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()));

        #[cfg(feature = "rate-limit")]
        let app = app.wrap(middleware::rate_limit::RateLimitMiddleware::new(
            state.rate_limiter.clone(),
        ));

        app.configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    if let Some(sweep) = expiry_sweep {
        if let Err(e) = sweep.stop().await {
            tracing::warn!(error = %e, "Expiry sweep did not stop cleanly");
        }
    }

    served
}

/// Start the expiry sweep, if one is configured and scheduling is enabled.
#[cfg(feature = "scheduler")]
async fn start_scheduler(config: &AppConfig, state: &AppState) -> Option<background::ExpirySweep> {
    let schedule = config.expiry_sweep_cron.as_deref()?;
    if !config.scheduler_enabled {
        tracing::info!("Scheduler disabled, expiry sweep not started");
        return None;
    }

    match background::ExpirySweep::start(schedule, state.posts.clone()).await {
        Ok(sweep) => Some(sweep),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start expiry sweep");
            None
        }
    }
}
