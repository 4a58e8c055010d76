mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod error;

use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, routing::get, response::Html};
use clap::Parser;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::api_routes::api_routes;
use crate::services::irradiance_predictor::IrradiancePredictor;
use crate::services::weather_service::WeatherClient;
use crate::shared_state::AppState;

#[derive(Debug, Parser)]
#[command(version, about = "Solar irradiance prediction and panel sizing server")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, env = "SOLAR_SIZER_CONFIG", default_value = "config.json")]
    config: String,

    /// Overrides `server.port` from the configuration
    #[arg(long, env = "SOLAR_SIZER_PORT")]
    port: Option<u16>,

    /// Overrides `weather.api_key` from the configuration
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();
    let args = Args::parse();

    // 1. Load configuration
    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.api_key.is_some() {
        config.weather.api_key = args.api_key;
    }
    info!(
        path = %args.config,
        panels = config.panels.len(),
        weather_api = config.weather.api_key.is_some(),
        "Configuration loaded"
    );

    // 2. Load model artifacts; a failure only disables prediction
    let predictor = IrradiancePredictor::load(&config.model);

    // 3. Initialize shared state
    let weather = WeatherClient::new(config.weather.clone(), config.fallback.clone())
        .context("failed to build the weather HTTP client")?;
    let server_port = config.server.port;
    let static_dir = config.server.static_dir.clone();
    let state = AppState::new(config, predictor, weather);

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .fallback_service(ServeDir::new(static_dir))
        .layer((TraceLayer::new_for_http(), CorsLayer::permissive()));

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!(%addr, "API server listening");
    info!("Form UI: http://{addr}/  Scalar UI: http://{addr}/scalar");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .context("HTTP server failed")?;
    Ok(())
}
