pub mod compare;
pub mod health;
pub mod matchups;
pub mod meta;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::calculate::{ArchetypeRules, MatchupTable};
    use crate::config::AppConfig;
    use crate::storage::CorpusSource;

    pub const CORPUS: &str = r#"{
        "format": "Infinity",
        "decks": [
            {"url": "deck1", "event": "Set Champs", "date": "2025-03-28", "standing": "1st",
             "archetype": "Amber/Steel",
             "cards": [{"name": "Mickey Mouse", "quantity": 4}]},
            {"url": "deck2", "event": "Set Champs", "date": "2025-03-28", "standing": "Top 8",
             "archetype": "Amber/Steel",
             "cards": [{"name": "Mickey Mouse", "quantity": 4}, {"name": "Goofy", "quantity": 4}]},
            {"url": "deck3", "event": "League", "date": "2025-03-10", "standing": "2nd",
             "archetype": "Ruby/Sapphire",
             "cards": [{"name": "Pluto", "quantity": 4}, {"name": "Stitch", "quantity": 4}]}
        ]
    }"#;

    pub fn state_with_corpus(dir: &Path, config: AppConfig) -> AppState {
        let path = dir.join("tournament_meta.json");
        std::fs::write(&path, CORPUS).unwrap();
        AppState::new(
            config,
            CorpusSource::new(vec![path]),
            ArchetypeRules::builtin(),
            MatchupTable::builtin(),
        )
    }

    pub fn state_without_corpus(dir: &Path) -> AppState {
        AppState::new(
            AppConfig::default(),
            CorpusSource::new(vec![dir.join("missing.json")]),
            ArchetypeRules::builtin(),
            MatchupTable::builtin(),
        )
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
