// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployments, StatefulSets and Services the scenarios run.

use super::{app_labels, meta};
use crate::config::Config;
use crate::constants::{names, snapshot};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EmptyDirVolumeSource, EnvVar, EnvVarSource, HTTPGetAction,
    LocalObjectReference, ObjectFieldSelector, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PodSpec, PodTemplateSpec, Probe, SecretVolumeSource, SecurityContext, Service, ServicePort,
    ServiceSpec, TCPSocketAction, Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

const HTML_DIR: &str = "/usr/share/nginx/html";

fn selector(app: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(app_labels(app)),
        ..Default::default()
    }
}

/// Pod template labelled `app=<app>`
fn template(app: &str, spec: PodSpec) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(app_labels(app)),
            ..Default::default()
        }),
        spec: Some(spec),
    }
}

/// A Deployment of `replicas` pods labelled `app=<name>`
fn deployment(name: &str, namespace: &str, replicas: i32, pod_spec: PodSpec) -> Deployment {
    let mut metadata = meta(name, Some(namespace));
    metadata.labels = Some(app_labels(name));

    Deployment {
        metadata,
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: selector(name),
            template: template(name, pod_spec),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn container_port(port: i32) -> Option<Vec<ContainerPort>> {
    Some(vec![ContainerPort {
        container_port: port,
        ..Default::default()
    }])
}

fn tcp_readiness(port: i32) -> Option<Probe> {
    Some(Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        period_seconds: Some(5),
        ..Default::default()
    })
}

fn http_readiness(port: i32) -> Option<Probe> {
    Some(Probe {
        http_get: Some(HTTPGetAction {
            path: Some("/".to_string()),
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        period_seconds: Some(5),
        ..Default::default()
    })
}

fn env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

fn cluster_ip_service(name: &str, namespace: &str, cluster_ip: &str, port: i32) -> Service {
    Service {
        metadata: meta(name, Some(namespace)),
        spec: Some(ServiceSpec {
            cluster_ip: Some(cluster_ip.to_string()),
            selector: Some(app_labels(name)),
            ports: Some(vec![ServicePort {
                name: Some(format!("port-{}", port)),
                port,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// S3-compatible object store mock
pub fn objectstore_mock_deployment(config: &Config) -> Deployment {
    let mock = &config.mock;
    let tls = mock.tls_enabled();

    let container = Container {
        name: mock.deployment.clone(),
        image: Some(mock.image.clone()),
        args: Some(vec!["server".to_string(), "/data".to_string()]),
        env: Some(vec![
            env("MINIO_ACCESS_KEY", &config.objectstore.access_key),
            env("MINIO_SECRET_KEY", &config.objectstore.secret_key),
        ]),
        ports: container_port(names::MOCK_PORT),
        readiness_probe: tcp_readiness(names::MOCK_PORT),
        volume_mounts: tls.then(|| {
            vec![VolumeMount {
                name: "certs".to_string(),
                mount_path: "/root/.minio/certs".to_string(),
                ..Default::default()
            }]
        }),
        ..Default::default()
    };
    let pod_spec = PodSpec {
        containers: vec![container],
        volumes: tls.then(|| {
            vec![Volume {
                name: "certs".to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(names::MOCK_TLS_SECRET.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }]
        }),
        ..Default::default()
    };

    deployment(&mock.deployment, &config.namespace, 1, pod_spec)
}

pub fn objectstore_mock_service(config: &Config) -> Service {
    cluster_ip_service(
        &config.mock.deployment,
        &config.namespace,
        &config.mock.cluster_ip,
        names::MOCK_PORT,
    )
}

/// The snapshot controller under test
pub fn controller_deployment(config: &Config) -> Deployment {
    let controller = &config.controller;
    let pod_spec = PodSpec {
        service_account_name: Some("default".to_string()),
        image_pull_secrets: controller.docker_config_json.as_ref().map(|_| {
            vec![LocalObjectReference {
                name: names::REGISTRY_KEY_SECRET.to_string(),
            }]
        }),
        containers: vec![Container {
            name: controller.deployment.clone(),
            image: Some(controller.image.clone()),
            image_pull_policy: Some("Always".to_string()),
            command: Some(vec![controller.command.clone()]),
            args: Some(vec!["--namespace".to_string(), config.namespace.clone()]),
            ..Default::default()
        }],
        ..Default::default()
    };

    deployment(&controller.deployment, &config.namespace, 1, pod_spec)
}

/// Stateless web app restored without volumes
pub fn test_app_deployment(config: &Config) -> Deployment {
    let app = &config.test_app;
    let pod_spec = PodSpec {
        containers: vec![Container {
            name: app.name.clone(),
            image: Some(app.image.clone()),
            ports: container_port(80),
            readiness_probe: http_readiness(80),
            ..Default::default()
        }],
        ..Default::default()
    };

    deployment(&app.name, &app.namespace, snapshot::TEST_APP_REPLICAS, pod_spec)
}

/// NFS server backing the persistent volumes
pub fn nfs_server_deployment(config: &Config) -> Deployment {
    let nfs = &config.nfs;
    let pod_spec = PodSpec {
        containers: vec![Container {
            name: nfs.deployment.clone(),
            image: Some(nfs.image.clone()),
            env: Some(vec![env("SHARED_DIRECTORY", "/exports")]),
            ports: container_port(names::NFS_PORT),
            security_context: Some(SecurityContext {
                privileged: Some(true),
                ..Default::default()
            }),
            volume_mounts: Some(vec![VolumeMount {
                name: "exports".to_string(),
                mount_path: "/exports".to_string(),
                ..Default::default()
            }]),
            readiness_probe: tcp_readiness(names::NFS_PORT),
            ..Default::default()
        }],
        volumes: Some(vec![Volume {
            name: "exports".to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }]),
        ..Default::default()
    };

    deployment(&nfs.deployment, &config.namespace, 1, pod_spec)
}

pub fn nfs_server_service(config: &Config) -> Service {
    cluster_ip_service(
        &config.nfs.deployment,
        &config.namespace,
        &config.nfs.cluster_ip,
        names::NFS_PORT,
    )
}

/// Web app whose pods each persist distinct content on an NFS volume.
///
/// An init container writes the pod's name and start time once; later starts
/// keep whatever the volume already holds, so restored pods serve the
/// content their predecessors wrote.
pub fn pv_test_app_stateful_set(config: &Config) -> StatefulSet {
    let app = &config.test_app;
    let mounts = Some(vec![VolumeMount {
        name: "html".to_string(),
        mount_path: HTML_DIR.to_string(),
        sub_path_expr: Some("$(POD_NAME)".to_string()),
        ..Default::default()
    }]);
    let pod_name_env = Some(vec![EnvVar {
        name: "POD_NAME".to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: "metadata.name".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }]);
    let seed = format!(
        "[ -s {dir}/index.html ] || echo \"$POD_NAME $(date +%s%N)\" > {dir}/index.html",
        dir = HTML_DIR
    );

    let pod_spec = PodSpec {
        init_containers: Some(vec![Container {
            name: "seed-content".to_string(),
            image: Some(app.image.clone()),
            command: Some(vec!["sh".to_string(), "-c".to_string(), seed]),
            env: pod_name_env.clone(),
            volume_mounts: mounts.clone(),
            ..Default::default()
        }]),
        containers: vec![Container {
            name: app.name.clone(),
            image: Some(app.image.clone()),
            env: pod_name_env,
            ports: container_port(80),
            volume_mounts: mounts,
            readiness_probe: http_readiness(80),
            ..Default::default()
        }],
        ..Default::default()
    };

    let claim = PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some("html".to_string()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: Some(config.nfs.storage_class.clone()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity("1Gi".to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut metadata = meta(&app.name, Some(app.pv_namespace.as_str()));
    metadata.labels = Some(app_labels(&app.name));

    StatefulSet {
        metadata,
        spec: Some(StatefulSetSpec {
            replicas: Some(snapshot::TEST_APP_REPLICAS),
            service_name: app.name.clone(),
            selector: selector(&app.name),
            template: template(&app.name, pod_spec),
            volume_claim_templates: Some(vec![claim]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
