//! JSON-over-HTTP transport
//!
//! Endpoints, relative to the base URL:
//!
//! | call | request |
//! |------|---------|
//! | list boards | `GET /boards` |
//! | list columns | `GET /columns?boardId=<id>` |
//! | list tasks | `GET /tasks` (flat; filtered by the caller) |
//! | create | `POST /<collection>` |
//! | update | `PUT /<collection>/<id>` |
//! | delete | `DELETE /<collection>/<id>` |
//!
//! Lists are retried on transient failures; writes are sent exactly once so a
//! timed-out write is never applied twice.

use crate::config::{RetryConfig, SyncConfig};
use crate::error::RemoteError;
use crate::remote::RemoteApi;
use crate::types::{EntityId, EntityKind};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// [`RemoteApi`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base: Url,
    retry: RetryConfig,
}

impl HttpRemote {
    pub fn new(base_url: &str, retry: RetryConfig, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl {
            message: format!("{}: {}", base_url, e),
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl {
                message: format!("{} cannot be a base URL", base_url),
            });
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            retry,
        })
    }

    /// Build from config; `None` when no base URL is configured
    pub fn from_config(config: &SyncConfig) -> Result<Option<Self>, RemoteError> {
        config
            .api_base_url
            .as_deref()
            .map(|url| Self::new(url, config.retry.clone(), config.request_timeout()))
            .transpose()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/<collection>[/<id>]`, with the id percent-encoded
    fn endpoint(&self, kind: EntityKind, id: Option<&EntityId>) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| RemoteError::InvalidUrl {
                message: format!("{} cannot be a base URL", self.base),
            })?;
            segments.pop_if_empty().push(kind.collection());
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Response, RemoteError> {
        debug!(%method, %url, "remote request");
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Send and decode a JSON body; an empty body decodes as `null`
    async fn send_json(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        let response = self.send(method, url.clone(), body).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET with bounded exponential backoff on transient failures
    async fn get_with_retry(&self, url: Url) -> Result<Value, RemoteError> {
        let mut attempt = 0;
        loop {
            match self.send_json(Method::GET, url.clone(), None).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(%url, attempt, ?delay, error = %e, "list failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn list(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
    ) -> Result<Value, RemoteError> {
        let mut url = self.endpoint(kind, None)?;
        if let (EntityKind::Column, Some(board_id)) = (kind, parent) {
            url.query_pairs_mut().append_pair("boardId", board_id.as_str());
        }
        self.get_with_retry(url).await
    }

    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, RemoteError> {
        let url = self.endpoint(kind, None)?;
        self.send_json(Method::POST, url, Some(&fields)).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.endpoint(kind, Some(id))?;
        self.send_json(Method::PUT, url, Some(&patch)).await
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), RemoteError> {
        let url = self.endpoint(kind, Some(id))?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    async fn remote(server: &MockServer) -> HttpRemote {
        HttpRemote::new(&server.uri(), fast_retry(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_columns_sends_board_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/columns"))
            .and(query_param("boardId", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let value = remote(&server)
            .await
            .list(EntityKind::Column, Some(&EntityId::from("7")))
            .await
            .unwrap();
        assert_eq!(value, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_list_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let value = remote(&server).await.list(EntityKind::Task, None).await.unwrap();
        assert_eq!(value, json!([]));
    }

    #[tokio::test]
    async fn test_list_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = remote(&server).await.list(EntityKind::Board, None).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert!(remote(&server).await.list(EntityKind::Board, None).await.is_err());
    }

    #[tokio::test]
    async fn test_update_is_sent_once_and_encodes_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/a%20b"))
            .and(body_json(json!({"position": 2, "columnId": "3"})))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = remote(&server)
            .await
            .update(
                EntityKind::Task,
                &EntityId::from("a b"),
                json!({"position": 2, "columnId": "3"}),
            )
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/boards"))
            .and(body_json(json!({"title": "Roadmap"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 9, "title": "Roadmap"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/boards/9"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemote::new(
            &format!("{}/api/", server.uri()),
            RetryConfig::none(),
            Duration::from_secs(5),
        )
        .unwrap();
        let created = remote
            .create(EntityKind::Board, json!({"title": "Roadmap"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 9);
        remote.delete(EntityKind::Board, &EntityId::from(9u64)).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = remote(&server)
            .await
            .update(EntityKind::Column, &EntityId::from("1"), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
    }

    #[test]
    fn test_rejects_non_base_url() {
        let timeout = Duration::from_secs(1);
        assert!(HttpRemote::new("mailto:x@y.z", RetryConfig::none(), timeout).is_err());
        assert!(HttpRemote::new("not a url", RetryConfig::none(), timeout).is_err());
    }

    #[test]
    fn test_from_config_local_only() {
        assert!(HttpRemote::from_config(&SyncConfig::default()).unwrap().is_none());
    }
}
