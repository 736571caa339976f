// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Removes everything the setup stages created.

use super::actions::{await_all_deleted, delete_if_exists};
use super::runner::{Stage, Step};
use crate::context::{ScenarioContext, StashKey, StashValue};
use crate::error::{HarnessError, Result};
use crate::kubernetes::pods::first_pod_with_app_label;
use crate::kubernetes::resources;
use futures::future::BoxFuture;
use futures::FutureExt;
use http::{Method, StatusCode};
use tracing::{info, warn};

pub fn teardown() -> Stage {
    Stage::new(
        "teardown",
        vec![
            Step::clean("find controller pod", stash_controller_pod),
            Step::clean("log controller output", log_controller_output),
            Step::clean("delete namespace", delete_namespace),
            Step::clean("namespace pods are gone", namespace_pods_gone),
            Step::clean("delete cluster role binding", delete_cluster_role_binding),
        ],
    )
}

fn stash_controller_pod(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let pods = resources::pods(&ctx.config.namespace);
        let controller =
            first_pod_with_app_label(&ctx.client, &pods, &ctx.config.controller.deployment).await?;
        match controller {
            Some(name) => {
                info!(pod = %name, "Found controller pod");
                ctx.stash(StashKey::ControllerPodName, StashValue::Text(name));
            }
            None => warn!("No controller pod running"),
        }
        Ok(())
    }
    .boxed()
}

fn log_controller_output(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let name = match ctx.stashed_text(StashKey::ControllerPodName) {
            Ok(name) => name,
            Err(HarnessError::StashMissing(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        let pod = resources::pods(&ctx.config.namespace).named(name);
        let response = ctx.client.get(&pod.subresource("log")).await?;
        response.expect_status(Method::GET, &[StatusCode::OK])?;

        info!(%pod, "Controller log:\n{}", response.text());
        Ok(())
    }
    .boxed()
}

fn delete_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { delete_if_exists(&ctx.client, &resources::namespace(&ctx.config.namespace)).await }
        .boxed()
}

fn namespace_pods_gone(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_all_deleted(ctx, &resources::pods(&ctx.config.namespace)).await }.boxed()
}

fn delete_cluster_role_binding(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let crb = resources::cluster_role_bindings().named(&ctx.config.namespace);
        delete_if_exists(&ctx.client, &crb).await
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::super::runner::run;
    use super::*;
    use crate::test_utils::{list_json, test_config, MockService};

    const NS: &str = "snapshot-test";

    #[tokio::test(start_paused = true)]
    async fn test_teardown_logs_controller_and_removes_namespace() {
        let log_path = "/api/v1/namespaces/snapshot-test/pods/ctrl-abc/log";
        let mock = MockService::new()
            .on_get(
                "/api/v1/namespaces/snapshot-test/pods",
                200,
                &list_json(&[]),
            )
            .on_get(log_path, 200, "snapshot 001 completed")
            .on_delete(&resources::namespace(NS).path(), 200, "{}")
            .on_delete(
                "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings/snapshot-test",
                200,
                "{}",
            );
        let mut ctx = ScenarioContext::new(test_config(), mock.clone().into_api_client());

        // the mock matches on path only, so the label-selector query sees the empty list
        ctx.stash(StashKey::ControllerPodName, StashValue::Text("ctrl-abc".to_string()));
        log_controller_output(&mut ctx).await.unwrap();
        assert_eq!(mock.count("GET", log_path), 1);

        let report = run(&mut ctx, &[teardown()], true).await;

        assert!(report.is_success(), "{:?}", report);
        let pod_queries: Vec<_> = mock
            .requests("GET", "/api/v1/namespaces/snapshot-test/pods")
            .into_iter()
            .map(|r| r.query)
            .collect();
        assert_eq!(
            pod_queries[0].as_deref(),
            Some("labelSelector=app%3Dhatoba-snapshot-controller")
        );
        assert!(pod_queries[1..].iter().all(Option::is_none));
        assert_eq!(mock.count("DELETE", &resources::namespace(NS).path()), 1);
        assert_eq!(
            mock.count(
                "DELETE",
                "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings/snapshot-test"
            ),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_tolerates_missing_objects() {
        let mock =
            MockService::new().on_get("/api/v1/namespaces/snapshot-test/pods", 200, &list_json(&[]));
        let mut ctx = ScenarioContext::new(test_config(), mock.clone().into_api_client());

        let report = run(&mut ctx, &[teardown()], false).await;

        assert!(report.is_success(), "{:?}", report);
    }
}
