// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The waits the scenarios use, each a check over a GET through [`ApiClient`].

use super::{PollOutcome, PollSignal, Poller};
use crate::error::Result;
use crate::kubernetes::{ApiClient, ApiResponse, ResourceRef};
use crate::types::Phase;
use http::{Method, StatusCode};
use serde_json::Value;
use tracing::{info, instrument};

/// Satisfied when `status.readyReplicas` equals `target` exactly. Only 200 is accepted.
pub fn readiness_check(target: i64) -> impl Fn(&ApiResponse) -> Result<PollSignal> {
    move |response| {
        response.expect_status(Method::GET, &[StatusCode::OK])?;
        let body: Value = response.json()?;
        let ready = body.pointer("/status/readyReplicas").and_then(Value::as_i64);
        Ok(if ready == Some(target) {
            PollSignal::Satisfied
        } else {
            PollSignal::NotYetSatisfied
        })
    }
}

/// Satisfied on 404, pending on 200
pub fn deletion_check(response: &ApiResponse) -> Result<PollSignal> {
    response.expect_status(Method::GET, &[StatusCode::OK, StatusCode::NOT_FOUND])?;
    Ok(if response.is_not_found() {
        PollSignal::Satisfied
    } else {
        PollSignal::NotYetSatisfied
    })
}

/// Satisfied when a list response has an empty `items` array. Only 200 is accepted.
pub fn emptiness_check(response: &ApiResponse) -> Result<PollSignal> {
    response.expect_status(Method::GET, &[StatusCode::OK])?;
    let body: Value = response.json()?;
    Ok(match body.get("items").and_then(Value::as_array) {
        Some(items) if items.is_empty() => PollSignal::Satisfied,
        _ => PollSignal::NotYetSatisfied,
    })
}

/// Satisfied on phase `Completed`, stops on `Failed`. Only 200 is accepted.
pub fn phase_check(response: &ApiResponse) -> Result<PollSignal> {
    response.expect_status(Method::GET, &[StatusCode::OK])?;
    let body: Value = response.json()?;
    Ok(match Phase::from_object(&body) {
        Phase::Completed => PollSignal::Satisfied,
        Phase::Failed { reason } => PollSignal::Stop(match reason {
            Some(r) => format!("phase is Failed: {}", r),
            None => "phase is Failed".to_string(),
        }),
        Phase::InProgress(_) => PollSignal::NotYetSatisfied,
    })
}

/// Wait until a Deployment or StatefulSet reports exactly `target` ready replicas
#[instrument(skip(client, poller, resource), fields(resource = %resource))]
pub async fn wait_ready(
    client: &ApiClient,
    poller: &Poller,
    resource: &ResourceRef,
    target: i64,
) -> Result<PollOutcome> {
    let path = resource.path();
    poller.poll(|| client.get(&path), readiness_check(target)).await
}

/// Wait until the resource is gone
#[instrument(skip(client, poller, resource), fields(resource = %resource))]
pub async fn wait_deleted(
    client: &ApiClient,
    poller: &Poller,
    resource: &ResourceRef,
) -> Result<PollOutcome> {
    let path = resource.path();
    poller.poll(|| client.get(&path), deletion_check).await
}

/// Wait until the collection lists no items.
///
/// Once empty, sleeps one more interval before returning so that deletions
/// still propagating through the cluster have finished.
#[instrument(skip(client, poller, collection), fields(collection = %collection))]
pub async fn wait_all_deleted(
    client: &ApiClient,
    poller: &Poller,
    collection: &ResourceRef,
) -> Result<PollOutcome> {
    let path = collection.collection().path();
    let outcome = poller.poll(|| client.get(&path), emptiness_check).await?;
    if outcome.is_observed() {
        info!("Collection is empty, settling for {:?}", poller.interval());
        poller.settle().await;
    }
    Ok(outcome)
}

/// Wait until a Snapshot or Restore reaches phase `Completed`
#[instrument(skip(client, poller, resource), fields(resource = %resource))]
pub async fn wait_phase(
    client: &ApiClient,
    poller: &Poller,
    resource: &ResourceRef,
) -> Result<PollOutcome> {
    let path = resource.path();
    poller.poll(|| client.get(&path), phase_check).await
}
