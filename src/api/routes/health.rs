use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub compare_enabled: bool,
    pub corpus_path: Option<String>,
    pub deck_count: usize,
    pub corpus_updated_at: Option<String>,
    pub note: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let compare_enabled = state.config.meta.compare_enabled;
    let load = tokio::task::spawn_blocking(move || state.load_corpus()).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        compare_enabled,
        corpus_path: load.path.as_ref().map(|p| p.display().to_string()),
        deck_count: load.corpus.len(),
        corpus_updated_at: load.corpus.updated_at.clone(),
        note: load.note,
    }))
}
