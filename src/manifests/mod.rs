// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Request bodies for every object the scenarios create, built from [`Config`](crate::config::Config).

pub mod cluster;
pub mod resources;
pub mod workloads;

use crate::constants::names;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub(crate) fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

pub(crate) fn app_labels(app: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(names::APP_LABEL.to_string(), app.to_string())])
}
