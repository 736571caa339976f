// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes API access: raw client, request paths, kubeconfig and pod lookups.

pub mod client;
pub mod kubeconfig;
pub mod paths;
pub mod pods;

pub use client::{ApiClient, ApiResponse};
pub use kubeconfig::{create_client, kubeconfig_yaml};
pub use paths::{resources, ResourceRef};
pub use pods::PodHttpClient;
