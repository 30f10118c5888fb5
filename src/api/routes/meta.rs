use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::AnalyzeOptions;
use crate::models::MetaReport;

/// Upper bound on the card popularity table size.
pub const MAX_CARD_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct MetaParams {
    pub format: Option<String>,
    /// Card table size
    pub cards: Option<usize>,
    /// Reference date, YYYY-MM-DD
    pub reference: Option<String>,
}

impl MetaParams {
    pub fn options(&self) -> Result<AnalyzeOptions, ApiError> {
        let mut options = AnalyzeOptions {
            format: self.format.clone().filter(|f| !f.trim().is_empty()),
            ..Default::default()
        };

        if let Some(cards) = self.cards {
            if cards == 0 || cards > MAX_CARD_LIMIT {
                return Err(ApiError::BadRequest(format!(
                    "cards must be between 1 and {}",
                    MAX_CARD_LIMIT
                )));
            }
            options.card_limit = cards;
        }

        if let Some(reference) = self.reference.as_deref() {
            let date = NaiveDate::parse_from_str(reference.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!(
                    "Invalid reference date (expected YYYY-MM-DD): {}",
                    reference
                ))
            })?;
            options.reference_date = Some(date);
        }

        Ok(options)
    }
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    #[serde(flatten)]
    pub report: MetaReport,
    pub note: Option<String>,
}

pub async fn meta_report(
    State(state): State<AppState>,
    params: Result<Query<MetaParams>, QueryRejection>,
) -> Result<Json<MetaResponse>, ApiError> {
    let Query(params) = params?;
    let options = params.options()?;

    let (report, note) = tokio::task::spawn_blocking(move || state.analyze(&options)).await?;
    Ok(Json(MetaResponse { report, note }))
}
