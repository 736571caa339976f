// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::phase;
use serde_json::Value;

/// Progress of a Snapshot or Restore as reported in `status.phase`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Completed,
    Failed { reason: Option<String> },
    /// Any other value, or no phase yet
    InProgress(Option<String>),
}

impl Phase {
    /// Read the phase (and failure reason) from a Snapshot/Restore object
    pub fn from_object(object: &Value) -> Self {
        let status = object.get("status");
        let field = |name: &str| {
            status
                .and_then(|s| s.get(name))
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self::parse(field("phase").as_deref(), field("reason"))
    }

    pub fn parse(phase: Option<&str>, reason: Option<String>) -> Self {
        match phase {
            Some(phase::COMPLETED) => Phase::Completed,
            Some(phase::FAILED) => Phase::Failed { reason },
            other => Phase::InProgress(other.map(str::to_string)),
        }
    }
}
