// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{anyhow, Context, Result};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use snapshot_e2e::config::Config;
use snapshot_e2e::context::ScenarioContext;
use snapshot_e2e::kubernetes::ApiClient;
use snapshot_e2e::scenario;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // kube and reqwest pull in different rustls backends, so pick one explicitly
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting snapshot controller e2e run");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: cluster_url={}, namespace={}, clean_only={}",
        config.cluster_url, config.namespace, config.clean_only
    );

    let client = ApiClient::from_config(&config)
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let clean_only = config.clean_only;
    let mut ctx = ScenarioContext::new(config, client);
    let report = scenario::run(&mut ctx, &scenario::all(), clean_only).await;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} step(s) failed", report.failures().count());
        Ok(ExitCode::FAILURE)
    }
}
