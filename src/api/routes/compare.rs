use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{CompareOptions, SimilarityStrategy};
use crate::config::MetaConfig;
use crate::models::{CardEntry, ComparisonReport, DeckCounts, SuggestionReport};

/// Upper bound on `topK` accepted over HTTP.
pub const MAX_TOP_K: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    #[serde(default)]
    pub cards: Vec<CardEntry>,
    pub top: Option<u32>,
    #[serde(default)]
    pub same_format: bool,
    pub format: Option<String>,
    pub top_k: Option<usize>,
    #[serde(alias = "minSimilarity")]
    pub min_sim: Option<f64>,
    pub strategy: Option<String>,
}

impl CompareRequest {
    /// Validate the request and merge it over the configured defaults.
    pub fn options(&self, meta: &MetaConfig) -> Result<CompareOptions, ApiError> {
        if DeckCounts::from_entries(&self.cards).is_empty() {
            return Err(ApiError::BadRequest(
                "cards must contain at least one card with a name and positive quantity"
                    .to_string(),
            ));
        }

        let mut options = meta.compare_options();

        if let Some(top) = self.top {
            if top == 0 {
                return Err(ApiError::BadRequest("top must be at least 1".to_string()));
            }
            options.top = Some(top);
        }

        if let Some(top_k) = self.top_k {
            if top_k == 0 || top_k > MAX_TOP_K {
                return Err(ApiError::BadRequest(format!(
                    "topK must be between 1 and {}",
                    MAX_TOP_K
                )));
            }
            options.top_k = top_k;
        }

        if let Some(min_sim) = self.min_sim {
            if !(0.0..=1.0).contains(&min_sim) {
                return Err(ApiError::BadRequest(
                    "minSim must be between 0 and 1".to_string(),
                ));
            }
            options.min_similarity = min_sim;
        }

        if let Some(strategy) = self.strategy.as_deref() {
            options.strategy = strategy
                .parse::<SimilarityStrategy>()
                .map_err(ApiError::BadRequest)?;
        }

        options.same_format = self.same_format;
        options.format = self.format.clone();
        Ok(options)
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub comparison: ComparisonReport,
    pub suggestions: SuggestionReport,
}

pub async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let Json(request) = payload?;
    let options = request.options(&state.config.meta)?;

    let report =
        tokio::task::spawn_blocking(move || state.compare(&request.cards, &options)).await?;
    Ok(Json(report))
}

pub async fn suggestions(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let Json(request) = payload?;
    let options = request.options(&state.config.meta)?;

    let (comparison, suggestions) =
        tokio::task::spawn_blocking(move || state.suggest(&request.cards, &options)).await?;
    Ok(Json(SuggestionsResponse {
        comparison,
        suggestions,
    }))
}
