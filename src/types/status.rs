// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Status fields the failure backoff reads and writes.
pub trait ReconcileStatus {
    fn set_value(&mut self, value: String);
    fn failure_count(&self) -> i64;
    fn set_failure_count(&mut self, count: i64);
}

/// Common status of every dependent resource.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub failure_count: i64,
}

impl ReconcileStatus for SyncStatus {
    fn set_value(&mut self, value: String) {
        self.value = value;
    }

    fn failure_count(&self) -> i64 {
        self.failure_count
    }

    fn set_failure_count(&mut self, count: i64) {
        self.failure_count = count;
    }
}
