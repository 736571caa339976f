// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod phase;
pub mod snapshot;

pub use phase::Phase;
pub use snapshot::{
    ObjectstoreConfig, ObjectstoreConfigSpec, Restore, RestorePreference, RestorePreferenceSpec,
    RestoreSpec, RestoreStatus, Snapshot, SnapshotSpec, SnapshotStatus,
};
