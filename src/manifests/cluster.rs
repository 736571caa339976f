// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespaces, secrets, RBAC and storage objects.

use super::{app_labels, meta};
use crate::config::Config;
use crate::constants::names;
use k8s_openapi::api::core::v1::{
    NFSVolumeSource, Namespace, PersistentVolume, PersistentVolumeSpec, Secret,
};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: meta(name, None),
        ..Default::default()
    }
}

fn secret_data(entries: &[(&str, &str)]) -> BTreeMap<String, ByteString> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
        .collect()
}

/// Object store credentials referenced by the ObjectstoreConfig
pub fn cloud_credential_secret(config: &Config) -> Secret {
    Secret {
        metadata: meta(&config.objectstore.credential_secret, Some(&config.namespace)),
        data: Some(secret_data(&[
            ("accesskey", &config.objectstore.access_key),
            ("secretkey", &config.objectstore.secret_key),
        ])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// Pull secret for the controller image; `None` when no docker config is set
pub fn registry_key_secret(config: &Config) -> Option<Secret> {
    let docker_config = config.controller.docker_config_json.as_deref()?;
    Some(Secret {
        metadata: meta(names::REGISTRY_KEY_SECRET, Some(&config.namespace)),
        data: Some(secret_data(&[(".dockerconfigjson", docker_config)])),
        type_: Some("kubernetes.io/dockerconfigjson".to_string()),
        ..Default::default()
    })
}

/// Certificate and key the object store mock serves TLS with
pub fn mock_tls_secret(config: &Config) -> Option<Secret> {
    let cert = config.mock.tls_cert.as_deref()?;
    let key = config.mock.tls_key.as_deref()?;
    Some(Secret {
        metadata: meta(names::MOCK_TLS_SECRET, Some(&config.namespace)),
        data: Some(secret_data(&[("public.crt", cert), ("private.key", key)])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    })
}

/// Grants cluster-admin to the default service account of the harness namespace.
/// Named after the namespace so teardown can find it.
pub fn cluster_role_binding(config: &Config) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: meta(&config.namespace, None),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: names::CLUSTER_ADMIN_ROLE.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: "default".to_string(),
            namespace: Some(config.namespace.clone()),
            ..Default::default()
        }]),
    }
}

/// StorageClass the NFS persistent volumes are pre-provisioned under
pub fn storage_class(config: &Config) -> StorageClass {
    StorageClass {
        metadata: meta(&config.nfs.storage_class, None),
        provisioner: "kubernetes.io/no-provisioner".to_string(),
        reclaim_policy: Some("Retain".to_string()),
        volume_binding_mode: Some("Immediate".to_string()),
        ..Default::default()
    }
}

/// Name of the `index`-th (1-based) NFS persistent volume
pub fn persistent_volume_name(config: &Config, index: u32) -> String {
    format!("{}-{:02}", config.nfs.pv_name, index)
}

/// An NFS-backed persistent volume on the in-cluster NFS server
pub fn nfs_persistent_volume(config: &Config, index: u32) -> PersistentVolume {
    let name = persistent_volume_name(config, index);
    let mut metadata = meta(&name, None);
    metadata.labels = Some(app_labels(&config.nfs.deployment));

    PersistentVolume {
        metadata,
        spec: Some(PersistentVolumeSpec {
            capacity: Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity("1Gi".to_string()),
            )])),
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            storage_class_name: Some(config.nfs.storage_class.clone()),
            nfs: Some(NFSVolumeSource {
                server: config.nfs.cluster_ip.clone(),
                path: "/".to_string(),
                read_only: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
