// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Linear retry delays driven by the failure counter in a resource status.

use std::time::Duration;

use crate::constants::{requeue, STATUS_OK};
use crate::types::ReconcileStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureBackoff {
    base: Duration,
}

impl Default for FailureBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(requeue::FAILURE_BASE_SECS))
    }
}

impl FailureBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// Delay before retrying after a failure: `base * (failures + 1)`.
    /// Counts the failure in `status`.
    pub fn next_delay(&self, status: &mut impl ReconcileStatus) -> Duration {
        let failures = status.failure_count().max(0);
        let factor = u32::try_from(failures.saturating_add(1)).unwrap_or(u32::MAX);
        let delay = self.base.checked_mul(factor).unwrap_or(Duration::MAX);

        status.set_failure_count(failures.saturating_add(1));
        delay
    }

    pub fn reset_on_success(&self, status: &mut impl ReconcileStatus) {
        status.set_value(STATUS_OK.to_string());
        status.set_failure_count(0);
    }
}
