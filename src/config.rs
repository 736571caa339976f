// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{poll, serviceaccount};
use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Harness configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Kubernetes API server
    pub cluster_url: String,
    /// Bearer token sent with every API request
    pub token: String,
    /// PEM encoded CA of the API server, if known
    pub ca_cert: Option<String>,
    /// Test clusters serve self-signed certificates, so verification is off unless asked for
    pub insecure_skip_tls_verify: bool,
    /// Namespace the controller, its config and the mocks live in
    pub namespace: String,
    /// Cluster name recorded on Snapshot/Restore resources, also the name prefix
    pub target_name: String,
    pub controller: ControllerSettings,
    pub objectstore: ObjectStoreSettings,
    pub mock: MockSettings,
    pub test_app: TestAppSettings,
    pub nfs: NfsSettings,
    /// Name of the RestorePreference created before each restore
    pub restore_preference: String,
    pub poll: PollSettings,
    /// Only run teardown steps
    pub clean_only: bool,
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub image: String,
    pub deployment: String,
    pub command: String,
    /// Contents of a `.dockerconfigjson` for pulling the controller image
    pub docker_config_json: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectStoreSettings {
    pub config_name: String,
    pub credential_secret: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct MockSettings {
    pub deployment: String,
    pub image: String,
    pub cluster_ip: String,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
}

impl MockSettings {
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }

    /// Endpoint the controller uses to reach the object store mock
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls_enabled() { "https" } else { "http" };
        format!(
            "{}://{}:{}",
            scheme,
            self.cluster_ip,
            crate::constants::names::MOCK_PORT
        )
    }
}

#[derive(Debug, Clone)]
pub struct TestAppSettings {
    pub namespace: String,
    pub pv_namespace: String,
    pub image: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NfsSettings {
    pub deployment: String,
    pub image: String,
    pub cluster_ip: String,
    pub pv_name: String,
    pub storage_class: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            attempts: poll::DEFAULT_ATTEMPTS,
            interval: Duration::from_secs(poll::DEFAULT_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let flag = |key: &str, default: bool| -> Result<bool> {
            match lookup(key) {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("{} must be true or false, got {:?}", key, v)),
                None => Ok(default),
            }
        };

        let cluster_url = var("E2E_CLUSTER_URL", serviceaccount::DEFAULT_CLUSTER_URL);
        url::Url::parse(&cluster_url)
            .with_context(|| format!("E2E_CLUSTER_URL is not a valid URL: {}", cluster_url))?;

        let token = match optional("E2E_TOKEN") {
            Some(token) => token,
            None => {
                let path = var("E2E_TOKEN_FILE", serviceaccount::TOKEN_FILE);
                std::fs::read_to_string(&path)
                    .with_context(|| {
                        format!("E2E_TOKEN not set and token file {} is unreadable", path)
                    })?
                    .trim()
                    .to_string()
            }
        };

        let ca_cert = match lookup("E2E_CA_CERT_FILE") {
            Some(path) if path.is_empty() => None,
            Some(path) => Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read CA certificate {}", path))?,
            ),
            None if Path::new(serviceaccount::CA_CERT_FILE).exists() => Some(
                std::fs::read_to_string(serviceaccount::CA_CERT_FILE)
                    .context("Failed to read service account CA certificate")?,
            ),
            None => None,
        };

        let attempts: u32 = var("E2E_POLL_ATTEMPTS", &poll::DEFAULT_ATTEMPTS.to_string())
            .parse()
            .context("E2E_POLL_ATTEMPTS must be a positive integer")?;
        if attempts == 0 {
            bail!("E2E_POLL_ATTEMPTS must be at least 1");
        }
        let interval_secs: u64 = var(
            "E2E_POLL_INTERVAL_SECS",
            &poll::DEFAULT_INTERVAL_SECS.to_string(),
        )
        .parse()
        .context("E2E_POLL_INTERVAL_SECS must be an integer")?;

        let controller_image = optional("E2E_CONTROLLER_IMAGE")
            .context("E2E_CONTROLLER_IMAGE environment variable not set")?;

        Ok(Config {
            cluster_url,
            token,
            ca_cert,
            insecure_skip_tls_verify: flag("E2E_INSECURE_SKIP_TLS_VERIFY", true)?,
            namespace: var("E2E_NAMESPACE", "snapshot-test"),
            target_name: var("E2E_TARGET_NAME", "target-cluster"),
            controller: ControllerSettings {
                image: controller_image,
                deployment: var("E2E_CONTROLLER_DEPLOYMENT", "hatoba-snapshot-controller"),
                command: var("E2E_CONTROLLER_COMMAND", "hatoba-snapshot-controller"),
                docker_config_json: optional("E2E_DOCKER_CONFIG_JSON"),
            },
            objectstore: ObjectStoreSettings {
                config_name: var("E2E_OBJECTSTORE_CONFIG", "objectstoreconfig"),
                credential_secret: var("E2E_CLOUD_CREDENTIAL_SECRET", "cloud-credential"),
                region: var("E2E_REGION", "jp-east-2"),
                bucket: var("E2E_BUCKET", "k8s-snap"),
                access_key: var("E2E_ACCESS_KEY", "minio"),
                secret_key: var("E2E_SECRET_KEY", "minio123"),
            },
            mock: MockSettings {
                deployment: var("E2E_MOCK_DEPLOYMENT", "minio"),
                image: var("E2E_MOCK_IMAGE", "minio/minio:RELEASE.2019-09-05T23-24-38Z"),
                cluster_ip: var("E2E_MOCK_CLUSTER_IP", "10.43.0.100"),
                tls_cert: optional("E2E_MOCK_TLS_CERT"),
                tls_key: optional("E2E_MOCK_TLS_KEY"),
            },
            test_app: TestAppSettings {
                namespace: var("E2E_TESTAPP_NAMESPACE", "restore-test-nginx"),
                pv_namespace: var("E2E_PV_TESTAPP_NAMESPACE", "restore-nginx-pv-test"),
                image: var("E2E_TESTAPP_IMAGE", "nginx"),
                name: var("E2E_TESTAPP_NAME", "nginx-test"),
            },
            nfs: NfsSettings {
                deployment: var("E2E_NFS_DEPLOYMENT", "nfs"),
                image: var("E2E_NFS_IMAGE", "itsthenetwork/nfs-server-alpine"),
                cluster_ip: var("E2E_NFS_CLUSTER_IP", "10.43.0.101"),
                pv_name: var("E2E_PV_NAME", "test-nfs-pv"),
                storage_class: var("E2E_STORAGE_CLASS", "test-nfs-storage"),
            },
            restore_preference: var("E2E_RESTORE_PREFERENCE", "exclude-existing"),
            poll: PollSettings {
                attempts,
                interval: Duration::from_secs(interval_secs),
            },
            clean_only: flag("E2E_CLEAN_ONLY", false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("E2E_TOKEN", "secret-token"),
        ("E2E_CA_CERT_FILE", ""),
        ("E2E_CONTROLLER_IMAGE", "registry.local/snapshot-controller:dev"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(MINIMAL)).unwrap();

        assert_eq!(config.cluster_url, "https://kubernetes.default");
        assert_eq!(config.token, "secret-token");
        assert!(config.ca_cert.is_none());
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.namespace, "snapshot-test");
        assert_eq!(config.target_name, "target-cluster");
        assert_eq!(config.poll.attempts, 9);
        assert_eq!(config.poll.interval, Duration::from_secs(30));
        assert!(config.controller.docker_config_json.is_none());
        assert!(!config.clean_only);
    }

    #[test]
    fn test_missing_controller_image_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("E2E_TOKEN", "t"),
            ("E2E_CA_CERT_FILE", ""),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("E2E_CONTROLLER_IMAGE"));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("E2E_POLL_ATTEMPTS", "0"));

        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_tls_verification_flag() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("E2E_INSECURE_SKIP_TLS_VERIFY", "false"));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(!config.insecure_skip_tls_verify);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("E2E_CLEAN_ONLY", "yes"));

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("E2E_CLEAN_ONLY"));
    }

    #[test]
    fn test_invalid_cluster_url_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("E2E_CLUSTER_URL", "not a url"));

        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_mock_endpoint_scheme_follows_tls() {
        let mut config = Config::from_lookup(lookup_from(MINIMAL)).unwrap();
        assert_eq!(config.mock.endpoint(), "http://10.43.0.100:9000");

        config.mock.tls_cert = Some("cert".to_string());
        config.mock.tls_key = Some("key".to_string());
        assert_eq!(config.mock.endpoint(), "https://10.43.0.100:9000");
    }
}
