// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! State threaded through the steps of a scenario run.

use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::kubernetes::{ApiClient, PodHttpClient};
use crate::poll::Poller;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Values one step leaves behind for later steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StashKey {
    /// Namespaces present before a test app was deployed
    ResidentNamespaces,
    /// Content served by the stateful test app's pod with this ordinal
    PodContent(u32),
    /// Name of the running controller pod
    ControllerPodName,
}

impl fmt::Display for StashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StashKey::ResidentNamespaces => write!(f, "resident namespaces"),
            StashKey::PodContent(ordinal) => write!(f, "content of pod {}", ordinal),
            StashKey::ControllerPodName => write!(f, "controller pod name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashValue {
    Text(String),
    List(Vec<String>),
}

/// Everything a step needs: configuration, clients, poll budget and the stash.
///
/// The stash lives for one run. [`ScenarioContext::reset`] clears it.
pub struct ScenarioContext {
    pub config: Config,
    pub client: ApiClient,
    pub http: PodHttpClient,
    pub poller: Poller,
    stash: HashMap<StashKey, StashValue>,
}

impl ScenarioContext {
    pub fn new(config: Config, client: ApiClient) -> Self {
        let poller = Poller::from(config.poll);
        Self {
            config,
            client,
            http: PodHttpClient::new(),
            poller,
            stash: HashMap::new(),
        }
    }

    pub fn stash(&mut self, key: StashKey, value: StashValue) {
        debug!(%key, ?value, "Stashing value");
        self.stash.insert(key, value);
    }

    pub fn stashed(&self, key: StashKey) -> Result<&StashValue> {
        self.stash.get(&key).ok_or(HarnessError::StashMissing(key))
    }

    pub fn stashed_text(&self, key: StashKey) -> Result<&str> {
        match self.stashed(key)? {
            StashValue::Text(text) => Ok(text),
            StashValue::List(_) => Err(HarnessError::Assertion(format!(
                "{} was stashed as a list, expected text",
                key
            ))),
        }
    }

    pub fn stashed_list(&self, key: StashKey) -> Result<&[String]> {
        match self.stashed(key)? {
            StashValue::List(items) => Ok(items),
            StashValue::Text(_) => Err(HarnessError::Assertion(format!(
                "{} was stashed as text, expected a list",
                key
            ))),
        }
    }

    /// Forget everything stashed by earlier steps
    pub fn reset(&mut self) {
        self.stash.clear();
    }
}
