// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Request paths for Kubernetes resources and collections.

use crate::constants::crd;
use std::fmt;

/// Identifies one Kubernetes object, or a collection when no name is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    prefix: String,
    namespace: Option<String>,
    resource: String,
    name: Option<String>,
}

impl ResourceRef {
    /// A resource of the core `v1` API
    pub fn core(resource: &str) -> Self {
        Self {
            prefix: "/api/v1".to_string(),
            namespace: None,
            resource: resource.to_string(),
            name: None,
        }
    }

    /// A resource of a named API group
    pub fn group(group: &str, version: &str, resource: &str) -> Self {
        Self {
            prefix: format!("/apis/{}/{}", group, version),
            namespace: None,
            resource: resource.to_string(),
            name: None,
        }
    }

    /// A resource served by the snapshot controller's API group
    pub fn snapshot_api(resource: &str) -> Self {
        Self::group(crd::GROUP, crd::VERSION, resource)
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// The collection this resource belongs to
    pub fn collection(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }

    pub fn path(&self) -> String {
        self.to_string()
    }

    /// Path of a subresource such as `log` or `status`
    pub fn subresource(&self, sub: &str) -> String {
        format!("{}/{}", self, sub)
    }

    /// Collection path filtered by a `key=value` label selector
    pub fn with_label_selector(&self, key: &str, value: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("labelSelector", &format!("{}={}", key, value))
            .finish();
        format!("{}?{}", self.collection(), query)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)?;
        if let Some(ns) = &self.namespace {
            write!(f, "/namespaces/{}", ns)?;
        }
        write!(f, "/{}", self.resource)?;
        if let Some(name) = &self.name {
            write!(f, "/{}", name)?;
        }
        Ok(())
    }
}

/// Shorthands for the paths the scenarios use
pub mod resources {
    use super::ResourceRef;
    use crate::constants::crd;

    pub fn namespaces() -> ResourceRef {
        ResourceRef::core("namespaces")
    }

    pub fn namespace(name: &str) -> ResourceRef {
        namespaces().named(name)
    }

    pub fn secrets(ns: &str) -> ResourceRef {
        ResourceRef::core("secrets").in_namespace(ns)
    }

    pub fn services(ns: &str) -> ResourceRef {
        ResourceRef::core("services").in_namespace(ns)
    }

    pub fn pods(ns: &str) -> ResourceRef {
        ResourceRef::core("pods").in_namespace(ns)
    }

    pub fn persistent_volumes() -> ResourceRef {
        ResourceRef::core("persistentvolumes")
    }

    pub fn deployments(ns: &str) -> ResourceRef {
        ResourceRef::group("apps", "v1", "deployments").in_namespace(ns)
    }

    pub fn stateful_sets(ns: &str) -> ResourceRef {
        ResourceRef::group("apps", "v1", "statefulsets").in_namespace(ns)
    }

    pub fn storage_classes() -> ResourceRef {
        ResourceRef::group("storage.k8s.io", "v1", "storageclasses")
    }

    pub fn cluster_role_bindings() -> ResourceRef {
        ResourceRef::group("rbac.authorization.k8s.io", "v1", "clusterrolebindings")
    }

    /// The CRD registering `plural` in the snapshot controller's group
    pub fn custom_resource_definition(plural: &str) -> ResourceRef {
        ResourceRef::group("apiextensions.k8s.io", "v1", "customresourcedefinitions")
            .named(&format!("{}.{}", plural, crd::GROUP))
    }

    pub fn snapshots(ns: &str) -> ResourceRef {
        ResourceRef::snapshot_api(crd::SNAPSHOTS).in_namespace(ns)
    }

    pub fn restores(ns: &str) -> ResourceRef {
        ResourceRef::snapshot_api(crd::RESTORES).in_namespace(ns)
    }

    pub fn objectstore_configs(ns: &str) -> ResourceRef {
        ResourceRef::snapshot_api(crd::OBJECTSTORE_CONFIGS).in_namespace(ns)
    }

    pub fn restore_preferences(ns: &str) -> ResourceRef {
        ResourceRef::snapshot_api(crd::RESTORE_PREFERENCES).in_namespace(ns)
    }
}
