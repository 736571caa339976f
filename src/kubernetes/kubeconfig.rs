// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig documents for the harness client and for Snapshot/Restore specs.

use crate::config::Config;
use crate::error::{HarnessError, Result};
use base64::prelude::{Engine, BASE64_STANDARD};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use serde_json::{json, Value};
use tracing::{instrument, warn};

const CONTEXT_NAME: &str = "snapshot-e2e";

/// Build a kubeconfig document pointing at the configured API server with bearer auth.
///
/// `insecure-skip-tls-verify` is set only when verification is switched off.
/// When verifying, a known CA is embedded; without one the reader falls back
/// to its system roots.
pub fn kubeconfig_document(config: &Config) -> Value {
    let mut cluster = json!({ "server": config.cluster_url });
    if config.insecure_skip_tls_verify {
        cluster["insecure-skip-tls-verify"] = json!(true);
    } else if let Some(ca) = &config.ca_cert {
        cluster["certificate-authority-data"] = json!(BASE64_STANDARD.encode(ca));
    }

    json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{ "name": CONTEXT_NAME, "cluster": cluster }],
        "users": [{ "name": CONTEXT_NAME, "user": { "token": config.token } }],
        "contexts": [{
            "name": CONTEXT_NAME,
            "context": {
                "cluster": CONTEXT_NAME,
                "user": CONTEXT_NAME,
                "namespace": config.namespace,
            }
        }],
        "current-context": CONTEXT_NAME,
    })
}

/// Render the kubeconfig as YAML, the form Snapshot and Restore specs carry it in
pub fn kubeconfig_yaml(config: &Config) -> Result<String> {
    serde_yaml::to_string(&kubeconfig_document(config))
        .map_err(|e| HarnessError::KubeconfigError(format!("Failed to render kubeconfig: {}", e)))
}

/// Create a Kubernetes client for the configured API server
#[instrument(skip(config), fields(cluster_url = %config.cluster_url))]
pub async fn create_client(config: &Config) -> Result<Client> {
    if config.insecure_skip_tls_verify {
        warn!("TLS certificate verification is disabled for the API server");
    }

    let kubeconfig: Kubeconfig = serde_json::from_value(kubeconfig_document(config))
        .map_err(|e| HarnessError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let mut client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                HarnessError::KubeconfigError(format!("Failed to create config: {}", e))
            })?;
    client_config.accept_invalid_certs = config.insecure_skip_tls_verify;

    Client::try_from(client_config)
        .map_err(|e| HarnessError::KubeconfigError(format!("Failed to create client: {}", e)))
}
