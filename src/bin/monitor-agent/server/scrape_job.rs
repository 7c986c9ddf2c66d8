use crate::server::util::{ApiError, ApiResponse, UniqueName};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use monitor_agent::prometheus::ScrapeJob;
use monitor_agent::store::Change;
use tracing::{debug, info};

pub(crate) async fn upsert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let job: ScrapeJob = serde_json::from_slice(&body)?;
    info!(job_name = %job.unique_name, "Upsert scrape job");

    let scrape_config = job.into_scrape_config(&state.probe_address);
    state
        .scrape_configs
        .update(move |configs| {
            let job_name = scrape_config.job_name.clone();
            let upsert = configs.upsert(scrape_config);
            debug!(%job_name, ?upsert, "Updated scrape configs");
            Ok(Change::Changed)
        })
        .await?;

    Ok(ApiResponse::success())
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    query: Result<Query<UniqueName>, QueryRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Query(UniqueName { unique_name }) = query?;
    info!(job_name = %unique_name, "Delete scrape job");

    let change = state
        .scrape_configs
        .update(|configs| {
            Ok(match configs.remove(&unique_name) {
                Some(_) => Change::Changed,
                None => Change::Unchanged,
            })
        })
        .await?;

    if change == Change::Unchanged {
        info!(job_name = %unique_name, "No such scrape job");
    }

    Ok(ApiResponse::success())
}
