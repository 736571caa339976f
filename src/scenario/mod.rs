// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The end-to-end run: setup, snapshot and restore checks, teardown.

pub mod actions;
pub mod restore;
pub mod runner;
pub mod setup;
pub mod teardown;

pub use runner::{run, RunReport, Stage, Step, StepStatus};

/// Every stage in execution order
pub fn all() -> Vec<Stage> {
    vec![
        setup::crds(),
        setup::prepare_namespace(),
        setup::objectstore_mock(),
        setup::controller(),
        restore::expire_snapshot(),
        restore::backup_restore_app(),
        restore::backup_restore_pv_app(),
        teardown::teardown(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = all().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "crds",
                "prepare-namespace",
                "objectstore-mock",
                "controller",
                "expire-snapshot",
                "backup-restore-app",
                "backup-restore-pv-app",
                "teardown",
            ]
        );
    }

    #[test]
    fn test_teardown_is_clean_only() {
        let stages = all();
        let teardown = stages.last().unwrap();
        assert!(teardown.steps.iter().all(|s| s.clean));
        assert!(stages[..stages.len() - 1]
            .iter()
            .flat_map(|s| s.steps.iter())
            .any(|s| !s.clean));
    }
}
