//! Stateless request builder and response parser for the sync endpoint.
//!
//! # Design
//! `TodoistClient` holds only the base URL and an optional token and carries
//! no mutable state between calls. `build_sync` turns a validated batch into
//! an `HttpRequest`; `parse_sync` turns the `HttpResponse` into a
//! `SyncResponse`. The I/O in between belongs to a `Transport`.

use crate::batch::BatchPayload;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::SyncResponse;

#[derive(Debug, Clone)]
pub struct TodoistClient {
    base_url: String,
    token: Option<String>,
}

impl TodoistClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url);
        match &config.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_sync(&self, payload: &BatchPayload) -> Result<HttpRequest, ApiError> {
        let body = payload.to_json()?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/sync", self.base_url),
            headers,
            body: Some(body),
        })
    }

    pub fn parse_sync(&self, response: HttpResponse) -> Result<SyncResponse, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
