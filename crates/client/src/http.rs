//! Thin JSON transport over `reqwest`.

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::envelope;
use crate::error::ClientError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const APP_TOKEN_HEADER: &str = "appToken";

/// Shared HTTP client. Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, Uuid) {
        let request_id = Uuid::now_v7();
        let mut req = self
            .http
            .request(method, self.config.url(path))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if let Some(token) = &self.config.api_token {
            req = req.bearer_auth(token);
        }
        if let Some(app_token) = &self.config.app_token {
            req = req.header(APP_TOKEN_HEADER, app_token);
        }

        (req, request_id)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let (req, request_id) = self.request(Method::GET, path);
        let req = if query.is_empty() { req } else { req.query(query) };
        self.send(req, "GET", path, request_id).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let (req, request_id) = self.request(Method::POST, path);
        self.send(req.json(body), "POST", path, request_id).await
    }

    async fn send(
        &self,
        req: RequestBuilder,
        method: &'static str,
        path: &str,
        request_id: Uuid,
    ) -> Result<Value, ClientError> {
        tracing::debug!(%request_id, method, path, "sending request");

        let resp = req.send().await.map_err(|e| {
            let err = ClientError::from(e);
            tracing::warn!(%request_id, method, path, error = %err, "request failed");
            err
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(ClientError::from)?;

        if !status.is_success() {
            let message = envelope::error_message(&text);
            tracing::warn!(%request_id, method, path, status = status.as_u16(), %message, "backend returned error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(%request_id, status = status.as_u16(), "response received");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
    }
}
