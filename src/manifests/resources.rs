// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Snapshot controller custom resources.

use super::meta;
use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::kubeconfig_yaml;
use crate::types::{
    ObjectstoreConfig, ObjectstoreConfigSpec, Restore, RestorePreference, RestorePreferenceSpec,
    RestoreSpec, Snapshot, SnapshotSpec,
};

/// Name of the Snapshot with the given suffix, e.g. `target-cluster-002`
pub fn snapshot_name(config: &Config, suffix: &str) -> String {
    format!("{}-{}", config.target_name, suffix)
}

/// Name of the first Restore of a snapshot
pub fn restore_name(config: &Config, suffix: &str) -> String {
    format!("{}-restore-01", snapshot_name(config, suffix))
}

/// Name of the RestorePreference used by the persistent volume scenario
pub fn pv_restore_preference_name(config: &Config) -> String {
    format!("{}-pv", config.restore_preference)
}

/// Points the controller at the object store mock
pub fn objectstore_config(config: &Config) -> ObjectstoreConfig {
    let mut resource = ObjectstoreConfig::new(
        &config.objectstore.config_name,
        ObjectstoreConfigSpec {
            region: config.objectstore.region.clone(),
            endpoint: config.mock.endpoint(),
            cloud_credential_secret: config.objectstore.credential_secret.clone(),
            bucket: config.objectstore.bucket.clone(),
        },
    );
    resource.metadata = meta(&config.objectstore.config_name, Some(&config.namespace));
    resource
}

/// A Snapshot of the target cluster, expiring after `ttl` when given
pub fn snapshot(config: &Config, suffix: &str, ttl: Option<&str>) -> Result<Snapshot> {
    let name = snapshot_name(config, suffix);
    let mut resource = Snapshot::new(
        &name,
        SnapshotSpec {
            cluster_name: config.target_name.clone(),
            kubeconfig: kubeconfig_yaml(config)?,
            objectstore_config: config.objectstore.config_name.clone(),
            ttl: ttl.map(str::to_string),
            available_until: None,
        },
    );
    resource.metadata = meta(&name, Some(&config.namespace));
    Ok(resource)
}

/// A Restore of the snapshot with `suffix` applying the named preference
pub fn restore(config: &Config, suffix: &str, preference: &str) -> Result<Restore> {
    let name = restore_name(config, suffix);
    let mut resource = Restore::new(
        &name,
        RestoreSpec {
            cluster_name: config.target_name.clone(),
            snapshot_name: snapshot_name(config, suffix),
            kubeconfig: kubeconfig_yaml(config)?,
            restore_preference_name: Some(preference.to_string()),
            ttl: None,
        },
    );
    resource.metadata = meta(&name, Some(&config.namespace));
    Ok(resource)
}

/// A preference that leaves `resident` namespaces alone and, when given,
/// restores volumes of the listed NFS storage classes
pub fn restore_preference(
    config: &Config,
    name: &str,
    resident: &[String],
    nfs_storage_classes: &[String],
) -> RestorePreference {
    let mut resource = RestorePreference::new(
        name,
        RestorePreferenceSpec {
            exclude_namespaces: resident.to_vec(),
            restore_nfs_storage_classes: nfs_storage_classes.to_vec(),
            ..Default::default()
        },
    );
    resource.metadata = meta(name, Some(&config.namespace));
    resource
}
