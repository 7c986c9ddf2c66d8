use anyhow::{Context, Result};
use axum::routing::put;
use axum::{Router, Server};
use monitor_agent::blackbox::Modules;
use monitor_agent::config::MonitorAgentConfig;
use monitor_agent::document::Document;
use monitor_agent::prometheus::ScrapeConfigs;
use monitor_agent::reload::ReloadNotifier;
use monitor_agent::store::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

mod prober;
mod scrape_job;
mod util;

#[derive(Clone)]
pub(crate) struct AppState {
    pub scrape_configs: Arc<Store<ScrapeConfigs>>,
    pub modules: Arc<Store<Modules>>,

    /// Address of the blackbox exporter as seen from Prometheus.
    pub probe_address: Arc<str>,
}

impl AppState {
    /// Load both agent documents. This is the only time they are read from
    /// disk, afterwards the in-memory copy is the source of truth.
    pub(crate) fn load(config: &MonitorAgentConfig) -> Result<Self> {
        let prometheus = &config.prometheus_agent;
        let document = Document::<ScrapeConfigs>::load(&prometheus.config_path)
            .context("Unable to load Prometheus configuration")?;
        info!(
            path = ?prometheus.config_path,
            scrape_jobs = document.section().len(),
            "Loaded Prometheus configuration"
        );
        let scrape_configs = Store::new(
            document,
            ReloadNotifier::new(
                "prometheus",
                prometheus.reload_endpoint.clone(),
                prometheus.reload_timeout,
            ),
        );

        let blackbox = &config.blackbox_agent;
        let document = Document::<Modules>::load(&blackbox.config_path)
            .context("Unable to load blackbox exporter configuration")?;
        info!(
            path = ?blackbox.config_path,
            modules = document.section().len(),
            "Loaded blackbox exporter configuration"
        );
        let modules = Store::new(
            document,
            ReloadNotifier::new(
                "blackbox",
                blackbox.reload_endpoint.clone(),
                blackbox.reload_timeout,
            ),
        );

        Ok(AppState {
            scrape_configs: Arc::new(scrape_configs),
            modules: Arc::new(modules),
            probe_address: blackbox.probe_address.as_str().into(),
        })
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/prober", put(prober::upsert).delete(prober::delete))
        .route(
            "/scrapeJob",
            put(scrape_job::upsert).delete(scrape_job::delete),
        )
        .with_state(state)
}

pub(crate) async fn start_web_server(listen_address: &SocketAddr, state: AppState) -> Result<()> {
    let server = Server::try_bind(listen_address)
        .with_context(|| format!("failed to bind to {}", listen_address))?
        .serve(router(state).into_make_service());

    debug!("Web server listening on {}", server.local_addr());
    info!("API endpoint: http://{}", server.local_addr());

    server.await?;

    Ok(())
}
