// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::context::StashKey;
use http::{Method, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to build kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Unexpected status {status} for {method} {path}")]
    UnexpectedStatus {
        method: Method,
        path: String,
        status: StatusCode,
    },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("No value stashed for {0}")]
    StashMissing(StashKey),
}

impl HarnessError {
    /// True for failures that come from a check the scenario made, rather than
    /// from talking to the cluster.
    pub fn is_assertion(&self) -> bool {
        matches!(self, HarnessError::Assertion(_))
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
