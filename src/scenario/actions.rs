// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Building blocks the stages are written in.

use crate::context::ScenarioContext;
use crate::error::{HarnessError, Result};
use crate::kubernetes::{resources, ApiClient, ResourceRef};
use crate::poll::{wait_all_deleted, wait_deleted, wait_phase, wait_ready};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

/// POST `body` to the collection of `resource`, expecting 201 Created
#[instrument(skip(client, body), fields(resource = %resource))]
pub async fn create<T: Serialize + ?Sized>(
    client: &ApiClient,
    resource: &ResourceRef,
    body: &T,
) -> Result<()> {
    let response = client.post(&resource.collection().path(), body).await?;
    response.expect_status(Method::POST, &[StatusCode::CREATED])?;
    info!("Created");
    Ok(())
}

/// DELETE the resource, expecting 200 OK
#[instrument(skip(client), fields(resource = %resource))]
pub async fn delete(client: &ApiClient, resource: &ResourceRef) -> Result<()> {
    let response = client.delete(&resource.path()).await?;
    response.expect_status(Method::DELETE, &[StatusCode::OK])?;
    info!("Deleted");
    Ok(())
}

/// DELETE the resource, treating an absent one as already cleaned up
#[instrument(skip(client), fields(resource = %resource))]
pub async fn delete_if_exists(client: &ApiClient, resource: &ResourceRef) -> Result<()> {
    match client.delete(&resource.path()).await {
        Ok(_) => {
            info!("Deleted");
            Ok(())
        }
        Err(HarnessError::UnexpectedStatus {
            status: StatusCode::NOT_FOUND,
            ..
        }) => {
            info!("Already gone");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// GET the resource, expecting 200 OK
pub async fn expect_exists(client: &ApiClient, resource: &ResourceRef) -> Result<()> {
    client
        .get(&resource.path())
        .await?
        .expect_status(Method::GET, &[StatusCode::OK])?;
    Ok(())
}

/// Names of all namespaces currently in the cluster
pub async fn namespace_names(client: &ApiClient) -> Result<Vec<String>> {
    let response = client.get(&resources::namespaces().path()).await?;
    response.expect_status(Method::GET, &[StatusCode::OK])?;

    let list: Value = response.json()?;
    Ok(list["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

pub async fn await_ready(ctx: &ScenarioContext, resource: &ResourceRef, replicas: i64) -> Result<()> {
    wait_ready(&ctx.client, &ctx.poller, resource, replicas)
        .await?
        .ensure_observed(&format!("{} with {} ready replicas", resource, replicas))
}

pub async fn await_deleted(ctx: &ScenarioContext, resource: &ResourceRef) -> Result<()> {
    wait_deleted(&ctx.client, &ctx.poller, resource)
        .await?
        .ensure_observed(&format!("deletion of {}", resource))
}

pub async fn await_all_deleted(ctx: &ScenarioContext, collection: &ResourceRef) -> Result<()> {
    wait_all_deleted(&ctx.client, &ctx.poller, collection)
        .await?
        .ensure_observed(&format!("empty {}", collection))
}

pub async fn await_completed(ctx: &ScenarioContext, resource: &ResourceRef) -> Result<()> {
    wait_phase(&ctx.client, &ctx.poller, resource)
        .await?
        .ensure_observed(&format!("{} completed", resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{list_json, not_found_json, MockService};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_requires_201() {
        let collection = resources::namespaces();
        let mock = MockService::new().on_post(&collection.path(), 200, "{}");
        let client = mock.clone().into_api_client();

        let err = create(&client, &resources::namespace("app"), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HarnessError::UnexpectedStatus { status: StatusCode::OK, .. }
        ));
        assert_eq!(mock.count("POST", "/api/v1/namespaces"), 1);
    }

    #[tokio::test]
    async fn test_create_posts_to_collection() {
        let mock = MockService::new().on_post("/api/v1/namespaces", 201, "{}");
        let client = mock.clone().into_api_client();

        create(&client, &resources::namespace("app"), &json!({ "kind": "Namespace" }))
            .await
            .unwrap();

        let recorded = mock.requests("POST", "/api/v1/namespaces");
        assert_eq!(recorded[0].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_delete_if_exists_tolerates_not_found() {
        let ns = resources::namespace("gone");
        let client = MockService::new()
            .on_delete(&ns.path(), 404, &not_found_json("namespaces", "gone"))
            .into_api_client();

        delete_if_exists(&client, &ns).await.unwrap();
        assert!(delete(&client, &ns).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_if_exists_propagates_other_errors() {
        let ns = resources::namespace("locked");
        let client = MockService::new()
            .on_delete(&ns.path(), 403, "{}")
            .into_api_client();

        assert!(delete_if_exists(&client, &ns).await.is_err());
    }

    #[tokio::test]
    async fn test_namespace_names() {
        let client = MockService::new()
            .on_get(
                "/api/v1/namespaces",
                200,
                &list_json(&["default", "kube-system", "snapshot-test"]),
            )
            .into_api_client();

        let names = namespace_names(&client).await.unwrap();
        assert_eq!(names, vec!["default", "kube-system", "snapshot-test"]);
    }

    #[tokio::test]
    async fn test_expect_exists_rejects_missing() {
        let crd = resources::custom_resource_definition("snapshots");
        let client = MockService::new().into_api_client();

        let err = expect_exists(&client, &crd).await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::UnexpectedStatus { status: StatusCode::NOT_FOUND, .. }
        ));
    }
}
