// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources of the snapshot controller, as far as the harness writes or reads them.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "clustersnapshot.hatoba", version = "v1alpha1", kind = "Snapshot")]
#[kube(namespaced)]
#[kube(status = "SnapshotStatus")]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    pub cluster_name: String,
    pub kubeconfig: String,
    pub objectstore_config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_until: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_contents: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_file_size: Option<i64>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "clustersnapshot.hatoba", version = "v1alpha1", kind = "Restore")]
#[kube(namespaced)]
#[kube(status = "RestoreStatus")]
#[serde(rename_all = "camelCase")]
pub struct RestoreSpec {
    pub cluster_name: String,
    pub snapshot_name: String,
    pub kubeconfig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_preference_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub num_created: i32,
    #[serde(default)]
    pub num_failed: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "clustersnapshot.hatoba", version = "v1alpha1", kind = "ObjectstoreConfig")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ObjectstoreConfigSpec {
    pub region: String,
    pub endpoint: String,
    pub cloud_credential_secret: String,
    pub bucket: String,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "clustersnapshot.hatoba", version = "v1alpha1", kind = "RestorePreference")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreferenceSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_namespaces: Vec<String>,
    #[serde(rename = "excludeCRDs", default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_crds: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_api_pathes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restore_app_api_pathes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restore_nfs_storage_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restore_options: Vec<String>,
}
