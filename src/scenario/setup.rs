// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Stages that bring up the controller and its object store.

use super::actions::{await_ready, create, expect_exists};
use super::runner::{Stage, Step};
use crate::constants::crd;
use crate::context::ScenarioContext;
use crate::error::Result;
use crate::kubernetes::resources;
use crate::manifests::{cluster, resources as custom, workloads};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

pub fn crds() -> Stage {
    Stage::new("crds", vec![Step::new("crds are registered", crds_registered)])
}

pub fn prepare_namespace() -> Stage {
    Stage::new(
        "prepare-namespace",
        vec![
            Step::new("create namespace", create_namespace),
            Step::new("create cloud credential", create_cloud_credential),
            Step::new("create objectstore config", create_objectstore_config),
            Step::new("create cluster role binding", create_cluster_role_binding),
            Step::new("create registry key", create_registry_key),
        ],
    )
}

pub fn objectstore_mock() -> Stage {
    Stage::new(
        "objectstore-mock",
        vec![
            Step::new("create tls secret", create_mock_tls_secret),
            Step::new("create deployment", create_mock_deployment),
            Step::new("create service", create_mock_service),
            Step::new("objectstore mock is ready", mock_ready),
        ],
    )
}

pub fn controller() -> Stage {
    Stage::new(
        "controller",
        vec![
            Step::new("create deployment", create_controller),
            Step::new("controller is ready", controller_ready),
        ],
    )
}

fn crds_registered(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        for plural in crd::ALL {
            expect_exists(&ctx.client, &resources::custom_resource_definition(plural)).await?;
        }
        Ok(())
    }
    .boxed()
}

fn create_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let ns = &ctx.config.namespace;
        create(&ctx.client, &resources::namespace(ns), &cluster::namespace(ns)).await
    }
    .boxed()
}

fn create_cloud_credential(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let secret = cluster::cloud_credential_secret(&ctx.config);
        create(&ctx.client, &resources::secrets(&ctx.config.namespace), &secret).await
    }
    .boxed()
}

fn create_objectstore_config(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = custom::objectstore_config(&ctx.config);
        create(&ctx.client, &resources::objectstore_configs(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn create_cluster_role_binding(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = cluster::cluster_role_binding(&ctx.config);
        create(&ctx.client, &resources::cluster_role_bindings(), &body).await
    }
    .boxed()
}

fn create_registry_key(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        match cluster::registry_key_secret(&ctx.config) {
            Some(secret) => {
                create(&ctx.client, &resources::secrets(&ctx.config.namespace), &secret).await
            }
            None => {
                info!("No docker config set, pulling the controller image anonymously");
                Ok(())
            }
        }
    }
    .boxed()
}

fn create_mock_tls_secret(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        match cluster::mock_tls_secret(&ctx.config) {
            Some(secret) => {
                create(&ctx.client, &resources::secrets(&ctx.config.namespace), &secret).await
            }
            None => {
                info!("No TLS certificate set, objectstore mock serves plain HTTP");
                Ok(())
            }
        }
    }
    .boxed()
}

fn create_mock_deployment(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::objectstore_mock_deployment(&ctx.config);
        create(&ctx.client, &resources::deployments(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn create_mock_service(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::objectstore_mock_service(&ctx.config);
        create(&ctx.client, &resources::services(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn mock_ready(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let deploy = resources::deployments(&ctx.config.namespace).named(&ctx.config.mock.deployment);
        await_ready(ctx, &deploy, 1).await
    }
    .boxed()
}

fn create_controller(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::controller_deployment(&ctx.config);
        create(&ctx.client, &resources::deployments(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn controller_ready(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let deploy =
            resources::deployments(&ctx.config.namespace).named(&ctx.config.controller.deployment);
        await_ready(ctx, &deploy, 1).await
    }
    .boxed()
}
