// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Realms are dependents of the Keycloak instance hosting them.

use kube::{Api, Client};

use crate::constants::finalizers;
use crate::error::Result;
use crate::reconcilers::Dependent;
use crate::types::{ClusterKeycloakRealm, HasKeycloakRef, KeycloakRealm, ParentRef, SyncStatus};

impl Dependent for KeycloakRealm {
    const FINALIZER: &'static str = finalizers::REALM;
    type Status = SyncStatus;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
        Api::namespaced(client, namespace.unwrap_or_default())
    }

    fn parent_ref(&self) -> Result<ParentRef> {
        self.keycloak_ref().map(ParentRef::from)
    }

    fn status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut SyncStatus {
        self.status.get_or_insert_with(SyncStatus::default)
    }
}

impl Dependent for ClusterKeycloakRealm {
    const FINALIZER: &'static str = finalizers::CLUSTER_REALM;
    type Status = SyncStatus;

    fn api(client: Client, _namespace: Option<&str>) -> Api<Self> {
        Api::all(client)
    }

    fn parent_ref(&self) -> Result<ParentRef> {
        self.keycloak_ref().map(ParentRef::from)
    }

    fn status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut SyncStatus {
        self.status.get_or_insert_with(SyncStatus::default)
    }
}
