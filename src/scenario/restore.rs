// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Snapshot and restore scenarios against the running controller.

use super::actions::{
    await_all_deleted, await_completed, await_deleted, await_ready, create, delete,
    delete_if_exists, namespace_names,
};
use super::runner::{Stage, Step};
use crate::constants::snapshot::{EXPIRING_TTL, PERSISTENT_VOLUMES, TEST_APP_REPLICAS};
use crate::context::{ScenarioContext, StashKey, StashValue};
use crate::error::{HarnessError, Result};
use crate::kubernetes::{resources, ResourceRef};
use crate::manifests::{cluster, resources as custom, workloads};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

const EXPIRING: &str = "001";
const APP: &str = "002";
const PV_APP: &str = "003";

pub fn expire_snapshot() -> Stage {
    Stage::new(
        "expire-snapshot",
        vec![
            Step::new("create snapshot with ttl", create_expiring_snapshot),
            Step::new("snapshot completes", expiring_snapshot_completed),
            Step::new("snapshot expires", expiring_snapshot_deleted),
        ],
    )
}

pub fn backup_restore_app() -> Stage {
    Stage::new(
        "backup-restore-app",
        vec![
            Step::new("stash resident namespaces", stash_resident_namespaces),
            Step::new("create app namespace", create_app_namespace),
            Step::new("create app deployment", create_app_deployment),
            Step::new("app is ready", app_ready),
            Step::new("create snapshot", create_app_snapshot),
            Step::new("snapshot completes", app_snapshot_completed),
            Step::new("delete app namespace", delete_app_namespace),
            Step::new("app pods are gone", app_pods_gone),
            Step::new("create restore preference", create_app_preference),
            Step::new("create restore", create_app_restore),
            Step::new("restore completes", app_restore_completed),
            Step::new("app is ready after restore", app_ready),
            Step::clean("remove app namespace", remove_app_namespace),
            Step::clean("app pods are removed", app_pods_gone),
        ],
    )
}

pub fn backup_restore_pv_app() -> Stage {
    Stage::new(
        "backup-restore-pv-app",
        vec![
            Step::new("stash resident namespaces", stash_resident_namespaces),
            Step::new("create nfs deployment", create_nfs_deployment),
            Step::new("create nfs service", create_nfs_service),
            Step::new("nfs server is ready", nfs_ready),
            Step::new("create storage class", create_storage_class),
            Step::new("create persistent volumes", create_persistent_volumes),
            Step::new("create app namespace", create_pv_app_namespace),
            Step::new("create app stateful set", create_pv_app),
            Step::new("app is ready", pv_app_ready),
            Step::new("stash pod content", stash_pod_content),
            Step::new("create snapshot", create_pv_snapshot),
            Step::new("snapshot completes", pv_snapshot_completed),
            Step::new("delete app namespace", delete_pv_app_namespace),
            Step::new("app pods are gone", pv_app_pods_gone),
            Step::new("delete persistent volumes", delete_persistent_volumes),
            Step::new("create restore preference", create_pv_preference),
            Step::new("create restore", create_pv_restore),
            Step::new("restore completes", pv_restore_completed),
            Step::new("app is ready after restore", pv_app_ready),
            Step::new("pod content survived restore", compare_pod_content),
            Step::clean("remove app namespace", remove_pv_app_namespace),
            Step::clean("app pods are removed", pv_app_pods_gone),
            Step::clean("remove persistent volumes", remove_persistent_volumes),
            Step::clean("remove storage class", remove_storage_class),
        ],
    )
}

fn snapshot_ref(ctx: &ScenarioContext, suffix: &str) -> ResourceRef {
    resources::snapshots(&ctx.config.namespace).named(&custom::snapshot_name(&ctx.config, suffix))
}

fn restore_ref(ctx: &ScenarioContext, suffix: &str) -> ResourceRef {
    resources::restores(&ctx.config.namespace).named(&custom::restore_name(&ctx.config, suffix))
}

fn persistent_volume_refs(ctx: &ScenarioContext) -> Vec<ResourceRef> {
    (1..=PERSISTENT_VOLUMES)
        .map(|i| resources::persistent_volumes().named(&cluster::persistent_volume_name(&ctx.config, i)))
        .collect()
}

fn pv_app_pod(ctx: &ScenarioContext, ordinal: u32) -> ResourceRef {
    let app = &ctx.config.test_app;
    resources::pods(&app.pv_namespace).named(&format!("{}-{}", app.name, ordinal))
}

async fn create_snapshot(ctx: &ScenarioContext, suffix: &str, ttl: Option<&str>) -> Result<()> {
    let body = custom::snapshot(&ctx.config, suffix, ttl)?;
    create(&ctx.client, &resources::snapshots(&ctx.config.namespace), &body).await
}

async fn create_restore(ctx: &ScenarioContext, suffix: &str, preference: &str) -> Result<()> {
    let body = custom::restore(&ctx.config, suffix, preference)?;
    create(&ctx.client, &resources::restores(&ctx.config.namespace), &body).await
}

// expire-snapshot

fn create_expiring_snapshot(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { create_snapshot(ctx, EXPIRING, Some(EXPIRING_TTL)).await }.boxed()
}

fn expiring_snapshot_completed(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_completed(ctx, &snapshot_ref(ctx, EXPIRING)).await }.boxed()
}

fn expiring_snapshot_deleted(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_deleted(ctx, &snapshot_ref(ctx, EXPIRING)).await }.boxed()
}

// backup-restore-app

fn stash_resident_namespaces(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let names = namespace_names(&ctx.client).await?;
        info!(count = names.len(), "Resident namespaces");
        ctx.stash(StashKey::ResidentNamespaces, StashValue::List(names));
        Ok(())
    }
    .boxed()
}

fn create_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let ns = &ctx.config.test_app.namespace;
        create(&ctx.client, &resources::namespace(ns), &cluster::namespace(ns)).await
    }
    .boxed()
}

fn create_app_deployment(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::test_app_deployment(&ctx.config);
        create(&ctx.client, &resources::deployments(&ctx.config.test_app.namespace), &body).await
    }
    .boxed()
}

fn app_ready(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let app = &ctx.config.test_app;
        let deploy = resources::deployments(&app.namespace).named(&app.name);
        await_ready(ctx, &deploy, i64::from(TEST_APP_REPLICAS)).await
    }
    .boxed()
}

fn create_app_snapshot(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { create_snapshot(ctx, APP, None).await }.boxed()
}

fn app_snapshot_completed(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_completed(ctx, &snapshot_ref(ctx, APP)).await }.boxed()
}

fn delete_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { delete(&ctx.client, &resources::namespace(&ctx.config.test_app.namespace)).await }
        .boxed()
}

fn app_pods_gone(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_all_deleted(ctx, &resources::pods(&ctx.config.test_app.namespace)).await }
        .boxed()
}

fn create_app_preference(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let resident = ctx.stashed_list(StashKey::ResidentNamespaces)?;
        let body = custom::restore_preference(&ctx.config, &ctx.config.restore_preference, resident, &[]);
        create(&ctx.client, &resources::restore_preferences(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn create_app_restore(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { create_restore(ctx, APP, &ctx.config.restore_preference).await }.boxed()
}

fn app_restore_completed(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_completed(ctx, &restore_ref(ctx, APP)).await }.boxed()
}

fn remove_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        delete_if_exists(&ctx.client, &resources::namespace(&ctx.config.test_app.namespace)).await
    }
    .boxed()
}

// backup-restore-pv-app

fn create_nfs_deployment(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::nfs_server_deployment(&ctx.config);
        create(&ctx.client, &resources::deployments(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn create_nfs_service(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::nfs_server_service(&ctx.config);
        create(&ctx.client, &resources::services(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn nfs_ready(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let deploy = resources::deployments(&ctx.config.namespace).named(&ctx.config.nfs.deployment);
        await_ready(ctx, &deploy, 1).await
    }
    .boxed()
}

fn create_storage_class(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = cluster::storage_class(&ctx.config);
        create(&ctx.client, &resources::storage_classes(), &body).await
    }
    .boxed()
}

fn create_persistent_volumes(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        for i in 1..=PERSISTENT_VOLUMES {
            let body = cluster::nfs_persistent_volume(&ctx.config, i);
            create(&ctx.client, &resources::persistent_volumes(), &body).await?;
        }
        Ok(())
    }
    .boxed()
}

fn create_pv_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let ns = &ctx.config.test_app.pv_namespace;
        create(&ctx.client, &resources::namespace(ns), &cluster::namespace(ns)).await
    }
    .boxed()
}

fn create_pv_app(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let body = workloads::pv_test_app_stateful_set(&ctx.config);
        create(&ctx.client, &resources::stateful_sets(&ctx.config.test_app.pv_namespace), &body).await
    }
    .boxed()
}

fn pv_app_ready(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let app = &ctx.config.test_app;
        let sts = resources::stateful_sets(&app.pv_namespace).named(&app.name);
        await_ready(ctx, &sts, i64::from(TEST_APP_REPLICAS)).await
    }
    .boxed()
}

fn stash_pod_content(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        for ordinal in 0..TEST_APP_REPLICAS as u32 {
            let pod = pv_app_pod(ctx, ordinal);
            let content = ctx.http.fetch_pod_content(&ctx.client, &pod).await?;
            ctx.stash(StashKey::PodContent(ordinal), StashValue::Text(content));
        }
        Ok(())
    }
    .boxed()
}

fn create_pv_snapshot(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { create_snapshot(ctx, PV_APP, None).await }.boxed()
}

fn pv_snapshot_completed(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_completed(ctx, &snapshot_ref(ctx, PV_APP)).await }.boxed()
}

fn delete_pv_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        delete(&ctx.client, &resources::namespace(&ctx.config.test_app.pv_namespace)).await
    }
    .boxed()
}

fn pv_app_pods_gone(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        await_all_deleted(ctx, &resources::pods(&ctx.config.test_app.pv_namespace)).await
    }
    .boxed()
}

fn delete_persistent_volumes(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let volumes = persistent_volume_refs(ctx);
        for pv in &volumes {
            delete(&ctx.client, pv).await?;
        }
        for pv in &volumes {
            await_deleted(ctx, pv).await?;
        }
        Ok(())
    }
    .boxed()
}

fn create_pv_preference(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let resident = ctx.stashed_list(StashKey::ResidentNamespaces)?;
        let name = custom::pv_restore_preference_name(&ctx.config);
        let body = custom::restore_preference(
            &ctx.config,
            &name,
            resident,
            &[ctx.config.nfs.storage_class.clone()],
        );
        create(&ctx.client, &resources::restore_preferences(&ctx.config.namespace), &body).await
    }
    .boxed()
}

fn create_pv_restore(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let preference = custom::pv_restore_preference_name(&ctx.config);
        create_restore(ctx, PV_APP, &preference).await
    }
    .boxed()
}

fn pv_restore_completed(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move { await_completed(ctx, &restore_ref(ctx, PV_APP)).await }.boxed()
}

fn compare_pod_content(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        for ordinal in 0..TEST_APP_REPLICAS as u32 {
            let pod = pv_app_pod(ctx, ordinal);
            let expected = ctx.stashed_text(StashKey::PodContent(ordinal))?;
            let actual = ctx.http.fetch_pod_content(&ctx.client, &pod).await?;
            if actual != expected {
                return Err(HarnessError::Assertion(format!(
                    "{} serves {:?} after restore, expected {:?}",
                    pod, actual, expected
                )));
            }
            info!(%pod, "Content survived restore");
        }
        Ok(())
    }
    .boxed()
}

fn remove_pv_app_namespace(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        delete_if_exists(&ctx.client, &resources::namespace(&ctx.config.test_app.pv_namespace))
            .await
    }
    .boxed()
}

fn remove_persistent_volumes(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        for pv in persistent_volume_refs(ctx) {
            delete_if_exists(&ctx.client, &pv).await?;
        }
        Ok(())
    }
    .boxed()
}

fn remove_storage_class(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<()>> {
    async move {
        let sc = resources::storage_classes().named(&ctx.config.nfs.storage_class);
        delete_if_exists(&ctx.client, &sc).await
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::super::runner::{run, StepStatus};
    use super::*;
    use crate::test_utils::{list_json, not_found_json, phase_json, test_config, workload_json, MockService};
    use serde_json::Value;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NS: &str = "snapshot-test";

    fn context(mock: &MockService) -> ScenarioContext {
        ScenarioContext::new(test_config(), mock.clone().into_api_client())
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_created_completes_then_expires() {
        let snap = resources::snapshots(NS).named("target-cluster-001");
        let mock = MockService::new()
            .on_post(&snap.collection().path(), 201, &phase_json("target-cluster-001", None))
            .on_get_sequence(
                &snap.path(),
                vec![
                    (200, phase_json("target-cluster-001", None)),
                    (200, phase_json("target-cluster-001", Some("InProgress"))),
                    (200, phase_json("target-cluster-001", Some("Completed"))),
                    (200, phase_json("target-cluster-001", Some("Completed"))),
                    (404, not_found_json("snapshots", "target-cluster-001")),
                ],
            );
        let mut ctx = context(&mock);

        let report = run(&mut ctx, &[expire_snapshot()], false).await;

        assert!(report.is_success(), "{:?}", report);
        // three reads until Completed, two until gone
        assert_eq!(mock.count("GET", &snap.path()), 5);

        let posted: Value =
            serde_json::from_slice(&mock.requests("POST", &snap.collection().path())[0].body).unwrap();
        assert_eq!(posted["metadata"]["name"], "target-cluster-001");
        assert_eq!(posted["spec"]["ttl"], "1m");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_snapshot_stops_stage() {
        let snap = resources::snapshots(NS).named("target-cluster-001");
        let mock = MockService::new()
            .on_post(&snap.collection().path(), 201, "{}")
            .on_get(
                &snap.path(),
                200,
                r#"{"metadata":{"name":"target-cluster-001"},"status":{"phase":"Failed","reason":"bucket missing"}}"#,
            );
        let mut ctx = context(&mock);

        let report = run(&mut ctx, &[expire_snapshot()], false).await;

        // Failed is terminal: one read, no retries, deletion wait skipped
        assert_eq!(mock.count("GET", &snap.path()), 1);
        match &report.steps[1].status {
            StepStatus::Failed(msg) => assert!(msg.contains("bucket missing")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(report.steps[2].status, StepStatus::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_restore_app_roundtrip() {
        let app_ns = "restore-test-nginx";
        let deploy = resources::deployments(app_ns).named("nginx-test");
        let snap = resources::snapshots(NS).named("target-cluster-002");
        let restore = resources::restores(NS).named("target-cluster-002-restore-01");
        let pods = resources::pods(app_ns);
        let prefs = resources::restore_preferences(NS);

        let mock = MockService::new()
            .on_get("/api/v1/namespaces", 200, &list_json(&["default", "kube-system", NS]))
            .on_post("/api/v1/namespaces", 201, "{}")
            .on_post(&deploy.collection().path(), 201, "{}")
            .on_get_sequence(
                &deploy.path(),
                vec![
                    (200, workload_json("nginx-test", Some(2))),
                    (200, workload_json("nginx-test", Some(3))),
                ],
            )
            .on_post(&snap.collection().path(), 201, "{}")
            .on_get(&snap.path(), 200, &phase_json("target-cluster-002", Some("Completed")))
            .on_delete(&resources::namespace(app_ns).path(), 200, "{}")
            .on_get_sequence(
                &pods.path(),
                vec![(200, list_json(&["nginx-test-abc"])), (200, list_json(&[]))],
            )
            .on_post(&prefs.path(), 201, "{}")
            .on_post(&restore.collection().path(), 201, "{}")
            .on_get(&restore.path(), 200, &phase_json("target-cluster-002-restore-01", Some("Completed")));
        let mut ctx = context(&mock);

        let report = run(&mut ctx, &[backup_restore_app()], false).await;

        assert!(report.is_success(), "{:?}", report);
        let pref: Value = serde_json::from_slice(&mock.requests("POST", &prefs.path())[0].body).unwrap();
        assert_eq!(pref["metadata"]["name"], "exclude-existing");
        assert_eq!(pref["spec"]["excludeNamespaces"], serde_json::json!(["default", "kube-system", NS]));

        let posted_restore: Value =
            serde_json::from_slice(&mock.requests("POST", &restore.collection().path())[0].body).unwrap();
        assert_eq!(posted_restore["spec"]["snapshotName"], "target-cluster-002");
        assert_eq!(posted_restore["spec"]["restorePreferenceName"], "exclude-existing");
        // teardown deleted the namespace a second time
        assert_eq!(mock.count("DELETE", &resources::namespace(app_ns).path()), 2);
    }

    #[tokio::test]
    async fn test_missing_resident_namespaces_fails_preference() {
        let mock = MockService::new();
        let mut ctx = context(&mock);

        let err = create_app_preference(&mut ctx).await.unwrap_err();
        assert!(matches!(err, HarnessError::StashMissing(StashKey::ResidentNamespaces)));
        assert_eq!(mock.total(), 0);
    }

    async fn pod_server(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn pods_at(mock: MockService, ip: &str) -> MockService {
        let mut mock = mock;
        for ordinal in 0..3 {
            let name = format!("nginx-test-{}", ordinal);
            let pod = resources::pods("restore-nginx-pv-test").named(&name);
            mock = mock.on_get(&pod.path(), 200, &crate::test_utils::pod_json(&name, Some(ip)));
        }
        mock
    }

    #[tokio::test]
    async fn test_pod_content_compared_after_restore() {
        let server = pod_server("nginx-test-0 1700000000").await;
        let ip = server.address().to_string();
        let mock = pods_at(MockService::new(), &ip);
        let mut ctx = context(&mock);

        stash_pod_content(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.stashed_text(StashKey::PodContent(2)).unwrap(),
            "nginx-test-0 1700000000"
        );
        compare_pod_content(&mut ctx).await.unwrap();

        ctx.stash(StashKey::PodContent(1), StashValue::Text("other".to_string()));
        let err = compare_pod_content(&mut ctx).await.unwrap_err();
        assert!(err.is_assertion());
    }
}
