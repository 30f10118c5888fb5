use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::matchup::archetype_key;
use crate::calculate::{MatchupEstimate, UNKNOWN_ARCHETYPE};
use crate::models::{CardEntry, DeckCounts, TournamentDeck};

#[derive(Debug, Deserialize)]
pub struct MatchupParams {
    pub archetype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeckMatchupRequest {
    #[serde(default)]
    pub cards: Vec<CardEntry>,
    pub archetype: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupsResponse {
    pub archetype: String,
    /// The archetype was inferred from the cards rather than given
    pub inferred: bool,
    pub matchups: Vec<MatchupEstimate>,
}

pub async fn archetype_matchups(
    State(state): State<AppState>,
    params: Result<Query<MatchupParams>, QueryRejection>,
) -> Result<Json<MatchupsResponse>, ApiError> {
    let Query(params) = params?;
    let archetype = params
        .archetype
        .as_deref()
        .map(archetype_key)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest("archetype is required".to_string()))?;

    let matchups = state.matchups.matchups_for(&archetype, &DeckCounts::default());
    Ok(Json(MatchupsResponse {
        archetype,
        inferred: false,
        matchups,
    }))
}

pub async fn deck_matchups(
    State(state): State<AppState>,
    payload: Result<Json<DeckMatchupRequest>, JsonRejection>,
) -> Result<Json<MatchupsResponse>, ApiError> {
    let Json(request) = payload?;
    let counts = DeckCounts::from_entries(&request.cards);

    let given = request
        .archetype
        .as_deref()
        .map(archetype_key)
        .filter(|a| !a.is_empty());

    let (archetype, inferred) = match given {
        Some(archetype) => (archetype, false),
        None => {
            if counts.is_empty() {
                return Err(ApiError::BadRequest(
                    "Provide an archetype or at least one card".to_string(),
                ));
            }
            let deck = TournamentDeck {
                cards: request.cards.clone(),
                ..Default::default()
            };
            (state.rules.infer(&deck), true)
        }
    };

    let matchups = if archetype == UNKNOWN_ARCHETYPE {
        Vec::new()
    } else {
        state.matchups.matchups_for(&archetype, &counts)
    };

    Ok(Json(MatchupsResponse {
        archetype,
        inferred,
        matchups,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, post_json, state_without_corpus};
    use axum::http::StatusCode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_archetype_matchups() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(state_without_corpus(temp_dir.path()));

        let (status, json) = get_json(app, "/api/matchups?archetype=steel/amber").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["archetype"], "Amber/Steel");
        assert_eq!(json["inferred"], false);

        let matchups = json["matchups"].as_array().unwrap();
        assert!(!matchups.is_empty());
        assert_eq!(matchups[0]["opponent"], "Amber/Amethyst");
        assert_eq!(matchups[0]["winRate"], 0.6);
    }

    #[tokio::test]
    async fn test_archetype_required() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(state_without_corpus(temp_dir.path()));

        let (status, json) = get_json(app, "/api/matchups").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_deck_matchups_infer_archetype_and_apply_cards() {
        let temp_dir = TempDir::new().unwrap();
        let state = state_without_corpus(temp_dir.path());

        let body = r#"{"cards": [
            {"name": "Tinker Bell - Giant Fairy", "quantity": 4},
            {"name": "Goofy - Musketeer", "quantity": 4},
            {"name": "Donald Duck - Strutting His Stuff", "quantity": 4}
        ]}"#;
        let (status, json) = post_json(build_router(state.clone()), "/api/matchups", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["archetype"], "Emerald/Steel");
        assert_eq!(json["inferred"], true);

        let vs_amethyst = json["matchups"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["opponent"] == "Amber/Amethyst")
            .unwrap();
        assert_eq!(vs_amethyst["baseRate"], 0.46);
        assert_eq!(vs_amethyst["winRate"], 0.51);
        assert_eq!(vs_amethyst["adjustments"][0]["card"], "Tinker Bell - Giant Fairy");

        let (status, _) = post_json(build_router(state), "/api/matchups", r#"{"cards": []}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
