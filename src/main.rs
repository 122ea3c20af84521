// src/main.rs
mod api;
mod catalog;
mod config;
mod geometry;
mod load_order;
mod model;
mod orders;
mod packing_client;
mod placement;
mod planner;
mod stacking;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            log::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let layout_settings = app_config.layout.clone();
    let packing_config = app_config.packing_service.clone();

    log::info!("🚚 Truck load planner starting...");
    api::start_api_server(api_config, layout_settings, packing_config).await;
}
