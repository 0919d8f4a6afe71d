// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod dependent;
mod realm;

pub use dependent::{reconcile_trigger, Dependent, DependentReconciler, SyncContext, Synchronizer};
