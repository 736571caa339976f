// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod lookups and plain HTTP fetches from test application pods.

use crate::error::{HarnessError, Result};
use crate::kubernetes::client::ApiClient;
use crate::kubernetes::paths::ResourceRef;
use http::{Method, StatusCode};
use k8s_openapi::api::core::v1::Pod;
use serde_json::Value;
use tracing::{debug, instrument};

/// Read a pod's IP from `status.podIP`
#[instrument(skip(client, pod), fields(pod = %pod))]
pub async fn pod_ip(client: &ApiClient, pod: &ResourceRef) -> Result<String> {
    let response = client.get(&pod.path()).await?;
    response.expect_status(Method::GET, &[StatusCode::OK])?;

    let pod_obj: Pod = response.json()?;
    pod_obj
        .status
        .and_then(|s| s.pod_ip)
        .ok_or_else(|| HarnessError::Assertion(format!("Pod {} has no IP assigned", pod)))
}

/// Name of the first pod matching `app=<app>` in the collection
#[instrument(skip(client))]
pub async fn first_pod_with_app_label(
    client: &ApiClient,
    pods: &ResourceRef,
    app: &str,
) -> Result<Option<String>> {
    let path = pods.with_label_selector(crate::constants::names::APP_LABEL, app);
    let response = client.get(&path).await?;
    response.expect_status(Method::GET, &[StatusCode::OK])?;

    let list: Value = response.json()?;
    Ok(list["items"]
        .as_array()
        .and_then(|items| items.first())
        .and_then(|pod| pod.pointer("/metadata/name"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Fetches content served by test application pods over plain HTTP
#[derive(Clone, Default)]
pub struct PodHttpClient {
    http: reqwest::Client,
}

impl PodHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// GET `url`, expecting a 200, and return the body text
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HarnessError::Transport(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(HarnessError::Assertion(format!(
                "GET {} returned {}, expected 200",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HarnessError::Transport(format!("Failed to read body of {}: {}", url, e)))?;
        debug!(url, bytes = body.len(), "Fetched pod content");
        Ok(body)
    }

    /// Look up the pod's IP, then fetch `/` from it
    pub async fn fetch_pod_content(&self, client: &ApiClient, pod: &ResourceRef) -> Result<String> {
        let ip = pod_ip(client, pod).await?;
        let url = url::Url::parse(&format!("http://{}/", ip))
            .map_err(|e| HarnessError::Assertion(format!("Pod {} has invalid IP {}: {}", pod, ip, e)))?;
        self.fetch(url.as_str()).await
    }
}
