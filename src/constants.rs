// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Custom resources served by the snapshot controller
pub mod crd {
    /// API group of the snapshot controller's resources
    pub const GROUP: &str = "clustersnapshot.hatoba";
    /// API version of the snapshot controller's resources
    pub const VERSION: &str = "v1alpha1";

    pub const SNAPSHOTS: &str = "snapshots";
    pub const RESTORES: &str = "restores";
    pub const OBJECTSTORE_CONFIGS: &str = "objectstoreconfigs";
    pub const RESTORE_PREFERENCES: &str = "restorepreferences";

    /// Every plural the controller registers a CRD for
    pub const ALL: [&str; 4] = [SNAPSHOTS, RESTORES, OBJECTSTORE_CONFIGS, RESTORE_PREFERENCES];
}

/// Condition polling configuration
pub mod poll {
    /// Number of reads before a wait gives up
    pub const DEFAULT_ATTEMPTS: u32 = 9;
    /// Seconds slept between two reads
    pub const DEFAULT_INTERVAL_SECS: u64 = 30;
}

/// Values of `status.phase` on Snapshot and Restore resources
pub mod phase {
    pub const COMPLETED: &str = "Completed";
    pub const FAILED: &str = "Failed";
}

/// Names of objects the scenarios create alongside the configured ones
pub mod names {
    pub const REGISTRY_KEY_SECRET: &str = "registry-key";
    pub const MOCK_TLS_SECRET: &str = "objectstore-mock-tls";
    pub const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";
    pub const APP_LABEL: &str = "app";
    /// Port the object store mock listens on
    pub const MOCK_PORT: i32 = 9000;
    /// Port the NFS server exports on
    pub const NFS_PORT: i32 = 2049;
}

/// Defaults for a controller running inside the cluster it snapshots
pub mod serviceaccount {
    pub const TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
    pub const CA_CERT_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
    pub const DEFAULT_CLUSTER_URL: &str = "https://kubernetes.default";
}

/// Snapshots the scenarios take
pub mod snapshot {
    /// TTL of the snapshot that is expected to expire during the run
    pub const EXPIRING_TTL: &str = "1m";
    /// Replicas the test applications run with
    pub const TEST_APP_REPLICAS: i32 = 3;
    /// Persistent volumes pre-provisioned for the stateful test app, one per replica
    pub const PERSISTENT_VOLUMES: u32 = 3;
}
