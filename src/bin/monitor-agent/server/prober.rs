use crate::server::util::{ApiError, ApiResponse, UniqueName};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use monitor_agent::blackbox::{Module, Prober};
use monitor_agent::store::Change;
use tracing::info;

pub(crate) async fn upsert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let prober: Prober = serde_json::from_slice(&body)?;
    info!(module = %prober.unique_name, "Upsert prober");

    let name = prober.unique_name.clone();
    let module = Module::from(prober);
    state
        .modules
        .update(move |modules| {
            modules.upsert(&name, &module)?;
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
    info!(module = %unique_name, "Delete prober");

    let change = state
        .modules
        .update(|modules| {
            Ok(match modules.remove(&unique_name) {
                Some(_) => Change::Changed,
                None => Change::Unchanged,
            })
        })
        .await?;

    if change == Change::Unchanged {
        info!(module = %unique_name, "No such prober");
    }

    Ok(ApiResponse::success())
}
