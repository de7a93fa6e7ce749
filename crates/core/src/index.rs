//! Vector Index Client
//!
//! Read-only access to a named collection in a Qdrant-compatible vector
//! database. Collection creation and ingestion belong to a separate process;
//! this module only queries.

use crate::passage::ScoredPassage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Nearest-neighbour lookup over indexed passages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns up to `top_k` passages ranked by similarity to `vector`.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPassage>>;
}

#[derive(Serialize, Debug)]
struct QueryPointsRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Deserialize, Debug)]
struct QueryPointsResponse {
    result: QueryPointsResult,
}

#[derive(Deserialize, Debug)]
struct QueryPointsResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize, Debug)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Map<String, Value>>,
}

impl ScoredPoint {
    /// Points indexed without a string `text` payload carry nothing to quote.
    fn into_passage(self) -> Option<ScoredPassage> {
        let text = self.payload?.remove("text")?;
        match text {
            Value::String(text) => Some(ScoredPassage::new(text, self.score)),
            _ => None,
        }
    }
}

/// A `VectorIndex` speaking the Qdrant REST API.
pub struct QdrantIndex {
    http: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

impl QdrantIndex {
    /// Creates a client for `collection` on the server at `base_url`
    /// (e.g. `http://localhost:6333`).
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key,
        }
    }

    fn query_url(&self) -> String {
        format!("{}/collections/{}/points/query", self.base_url, self.collection)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPassage>> {
        let body = QueryPointsRequest {
            query: vector,
            limit: top_k,
            with_payload: true,
            with_vector: false,
        };

        let mut request = self.http.post(self.query_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response: QueryPointsResponse = request
            .send()
            .await
            .context("Failed to reach vector index")?
            .error_for_status()
            .context("Vector index rejected the query")?
            .json()
            .await
            .context("Malformed vector index response")?;

        Ok(response
            .result
            .points
            .into_iter()
            .filter_map(ScoredPoint::into_passage)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_trims_trailing_slash() {
        let index = QdrantIndex::new("http://localhost:6333/", "docs", None);
        assert_eq!(
            index.query_url(),
            "http://localhost:6333/collections/docs/points/query"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let vector = [0.1f32, 0.2];
        let body = QueryPointsRequest {
            query: &vector,
            limit: 5,
            with_payload: true,
            with_vector: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["limit"], 5);
        assert_eq!(json["with_payload"], true);
        assert_eq!(json["with_vector"], false);
        assert_eq!(json["query"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_response_skips_points_without_text() {
        let raw = r#"{
            "result": {
                "points": [
                    {"id": "a", "score": 0.92, "payload": {"text": "Hawking radiation"}},
                    {"id": "b", "score": 0.81, "payload": {"page": 3}},
                    {"id": "c", "score": 0.77},
                    {"id": "d", "score": 0.70, "payload": {"text": 42}},
                    {"id": "e", "score": 0.64, "payload": {"text": "Event horizon"}}
                ]
            },
            "status": "ok",
            "time": 0.001
        }"#;
        let response: QueryPointsResponse = serde_json::from_str(raw).unwrap();
        let passages: Vec<ScoredPassage> = response
            .result
            .points
            .into_iter()
            .filter_map(ScoredPoint::into_passage)
            .collect();

        assert_eq!(
            passages,
            vec![
                ScoredPassage::new("Hawking radiation", 0.92),
                ScoredPassage::new("Event horizon", 0.64),
            ]
        );
    }
}
