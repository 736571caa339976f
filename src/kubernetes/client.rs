// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Raw authenticated requests against the Kubernetes API server.

use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::kubernetes::kubeconfig::create_client;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

/// Status and body of one API round-trip
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub path: String,
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    fn not_found(path: &str) -> Self {
        Self {
            path: path.to_string(),
            status: StatusCode::NOT_FOUND,
            body: Bytes::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| HarnessError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Fail unless the status is one of `accepted`
    pub fn expect_status(&self, method: Method, accepted: &[StatusCode]) -> Result<&Self> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(HarnessError::UnexpectedStatus {
                method,
                path: self.path.clone(),
                status: self.status,
            })
        }
    }
}

/// Kubernetes API client issuing GET/POST/DELETE by path.
///
/// Authentication and TLS come from the wrapped kube [`Client`]. Nothing is
/// retried here.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(create_client(config).await?))
    }

    /// Read a resource or collection. A 404 is returned as a normal response with an empty body.
    #[instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        let response = self.send(Method::GET, path, None).await?;
        if response.is_not_found() {
            return Ok(ApiResponse::not_found(path));
        }
        ensure_success(Method::GET, response)
    }

    /// Create a resource from a JSON body
    #[instrument(skip(self, body))]
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        let payload = serde_json::to_vec(body).map_err(|source| HarnessError::Decode {
            path: path.to_string(),
            source,
        })?;
        let response = self.send(Method::POST, path, Some(payload)).await?;
        ensure_success(Method::POST, response)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        let response = self.send(Method::DELETE, path, None).await?;
        ensure_success(Method::DELETE, response)
    }

    async fn send(&self, method: Method, path: &str, payload: Option<Vec<u8>>) -> Result<ApiResponse> {
        let mut builder = Request::builder().method(method.clone()).uri(path);
        let body = match payload {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| HarnessError::Transport(format!("Invalid request {} {}: {}", method, path, e)))?;

        let response = self.client.send(request).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| {
                HarnessError::Transport(format!("Failed to read response of {} {}: {}", method, path, e))
            })?
            .to_bytes();

        debug!(%method, path, status = status.as_u16(), "API response");

        Ok(ApiResponse {
            path: path.to_string(),
            status,
            body,
        })
    }
}

fn ensure_success(method: Method, response: ApiResponse) -> Result<ApiResponse> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(HarnessError::UnexpectedStatus {
            method,
            path: response.path,
            status: response.status,
        })
    }
}
