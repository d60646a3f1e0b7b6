//! HTTP implementation of [`SdeBackend`]
//!
//! | Operation | Request |
//! |-----------|---------|
//! | catalog | `GET /sdes?industry=` |
//! | persisted | `GET /clients/{client}/selected-sdes` |
//! | commit | `POST /store-client-sdes` |
//! | remove one | `DELETE /sdes/remove` |
//! | clear all | `DELETE /sdes/clear-all` |
//! | create | `POST /sdes` |

use crate::backend::SdeBackend;
use crate::config::EngineConfig;
use crate::error::{ConstraintConflict, SyncError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use sde_catalog::{ClientId, EntityDefinition, EntityDraft, EntityName, IndustryFilter, SelectionRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SUCCESS: &str = "success";
const CONSTRAINT_VIOLATION: &str = "constraint_violation";

/// reqwest-backed client for the selection service
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create backend from config
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] if the base URL is invalid or the
    /// client cannot be built
    pub fn new(config: &EngineConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;
        Self::with_client(client, &config.base_url)
    }

    /// Create backend around an existing client
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] if `base_url` is not an absolute URL
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, SyncError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| SyncError::Config(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!("'{base_url}' cannot be a base url")));
        }
        Ok(Self { client, base_url })
    }

    /// Base URL
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            tracing::debug!(status = status.as_u16(), error = %err, "backend rejected request");
            return Err(err);
        }
        serde_json::from_str(&body).map_err(|e| SyncError::MalformedResponse(e.to_string()))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Map a non-2xx response onto the error taxonomy
fn error_from_response(status: StatusCode, body: &str) -> SyncError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut v| v.get_mut("detail").map(Value::take));

    if status == StatusCode::CONFLICT {
        if let Some(conflict) = detail.as_ref().and_then(constraint_conflict) {
            return SyncError::ConstraintViolation(conflict);
        }
    }

    let message = match &detail {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| body.trim().to_string(), str::to_string),
        _ => body.trim().to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => SyncError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Forbidden(message),
        _ => SyncError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

fn constraint_conflict(detail: &Value) -> Option<ConstraintConflict> {
    if detail.get("error").and_then(Value::as_str) != Some(CONSTRAINT_VIOLATION) {
        return None;
    }
    serde_json::from_value(detail.clone()).ok()
}

fn ensure_success(status: &str) -> Result<(), SyncError> {
    if status.eq_ignore_ascii_case(SUCCESS) {
        Ok(())
    } else {
        Err(SyncError::Server {
            status: 200,
            message: format!("unexpected status '{status}'"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Bare(Vec<EntityDefinition>),
    Wrapped { sdes: Vec<EntityDefinition> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectedBody {
    Wrapped { selected_sdes: Vec<SelectionRecord> },
    Bare(Vec<SelectionRecord>),
}

#[derive(Debug, Serialize)]
struct StoreRequest<'a> {
    client_id: &'a str,
    sdes: &'a [SelectionRecord],
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    status: String,
    #[serde(default)]
    saved_count: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    client_id: &'a str,
    pattern_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ClearRequest<'a> {
    client_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    cleared_count: Option<u64>,
}

#[async_trait]
impl SdeBackend for HttpBackend {
    async fn fetch_catalog(&self, filter: &IndustryFilter) -> Result<Vec<EntityDefinition>, SyncError> {
        let request = self
            .client
            .get(self.endpoint(&["sdes"]))
            .query(&[("industry", filter.as_query())]);
        let body: CatalogBody = self.send(request).await?;
        let entries = match body {
            CatalogBody::Bare(entries) | CatalogBody::Wrapped { sdes: entries } => entries,
        };
        tracing::debug!(%filter, count = entries.len(), "fetched catalog");
        Ok(entries)
    }

    async fn fetch_persisted(&self, client: &ClientId) -> Result<Vec<SelectionRecord>, SyncError> {
        let url = self.endpoint(&["clients", client.as_str(), "selected-sdes"]);
        let body: SelectedBody = self.send(self.client.get(url)).await?;
        Ok(match body {
            SelectedBody::Wrapped { selected_sdes } => selected_sdes,
            SelectedBody::Bare(records) => records,
        })
    }

    async fn commit_delta(&self, client: &ClientId, delta: &[SelectionRecord]) -> Result<u64, SyncError> {
        let request = self.client.post(self.endpoint(&["store-client-sdes"])).json(&StoreRequest {
            client_id: client.as_str(),
            sdes: delta,
        });
        let response: StoreResponse = self.send(request).await?;
        ensure_success(&response.status)?;
        Ok(response.saved_count.unwrap_or(delta.len() as u64))
    }

    async fn remove_one(&self, client: &ClientId, name: &EntityName) -> Result<(), SyncError> {
        let request = self.client.delete(self.endpoint(&["sdes", "remove"])).json(&RemoveRequest {
            client_id: client.as_str(),
            pattern_name: name.as_str(),
        });
        let response: StatusResponse = self.send(request).await?;
        ensure_success(&response.status)
    }

    async fn clear_all(&self, client: &ClientId) -> Result<u64, SyncError> {
        let request = self
            .client
            .delete(self.endpoint(&["sdes", "clear-all"]))
            .json(&ClearRequest {
                client_id: client.as_str(),
            });
        let response: StatusResponse = self.send(request).await?;
        ensure_success(&response.status)?;
        Ok(response.cleared_count.unwrap_or(0))
    }

    async fn create_entity(&self, draft: &EntityDraft) -> Result<EntityDefinition, SyncError> {
        let request = self.client.post(self.endpoint(&["sdes"])).json(draft);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AffectedSdes;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::with_client(Client::new(), base).unwrap()
    }

    #[test]
    fn endpoint_joins_segments() {
        let http = backend("http://localhost:8000");
        assert_eq!(
            http.endpoint(&["clients", "acme", "selected-sdes"]).as_str(),
            "http://localhost:8000/clients/acme/selected-sdes"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_and_escapes() {
        let http = backend("http://host/api/");
        assert_eq!(
            http.endpoint(&["clients", "a b/c", "selected-sdes"]).as_str(),
            "http://host/api/clients/a%20b%2Fc/selected-sdes"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpBackend::with_client(Client::new(), "not a url"),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn conflict_body_maps_to_constraint_violation() {
        let body = r#"{"detail":{"error":"constraint_violation","affected_sdes":["ssn"],"finding_count":3}}"#;
        let err = error_from_response(StatusCode::CONFLICT, body);

        let SyncError::ConstraintViolation(conflict) = err else {
            panic!("expected constraint violation, got {err:?}");
        };
        assert_eq!(conflict.finding_count, 3);
        assert_eq!(conflict.affected_sdes, AffectedSdes::Names(vec!["ssn".to_string()]));
    }

    #[test]
    fn other_conflict_is_server_error() {
        let err = error_from_response(StatusCode::CONFLICT, r#"{"detail":"version mismatch"}"#);
        assert_eq!(
            err,
            SyncError::Server {
                status: 409,
                message: "version mismatch".to_string()
            }
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, r#"{"detail":"SDE not found"}"#),
            SyncError::NotFound(m) if m == "SDE not found"
        ));
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, ""),
            SyncError::Forbidden(_)
        ));
        assert_eq!(
            error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "  database is locked \n"),
            SyncError::Server {
                status: 500,
                message: "database is locked".to_string()
            }
        );
    }

    #[test]
    fn non_success_status_is_rejected() {
        assert!(ensure_success("success").is_ok());
        assert!(matches!(ensure_success("partial"), Err(SyncError::Server { status: 200, .. })));
    }
}
