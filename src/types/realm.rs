// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::refs::{HasKeycloakRef, InstanceRef, RefSpec};
use crate::types::status::SyncStatus;

/// A realm hosted by a Keycloak or ClusterKeycloak.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "keycloak.geeko.me",
    version = "v1",
    kind = "KeycloakRealm",
    plural = "keycloakrealms"
)]
#[kube(namespaced)]
#[kube(status = "SyncStatus")]
#[serde(rename_all = "camelCase")]
pub struct KeycloakRealmSpec {
    /// Name of the realm in Keycloak
    pub realm_name: String,
    pub keycloak_ref: RefSpec,
}

/// A realm hosted by a ClusterKeycloak, referable from every namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "keycloak.geeko.me",
    version = "v1",
    kind = "ClusterKeycloakRealm",
    plural = "clusterkeycloakrealms"
)]
#[kube(status = "SyncStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterKeycloakRealmSpec {
    pub realm_name: String,
    /// Name of the ClusterKeycloak
    pub cluster_keycloak_ref: String,
}

impl HasKeycloakRef for KeycloakRealm {
    fn keycloak_ref(&self) -> Result<InstanceRef> {
        InstanceRef::try_from(&self.spec.keycloak_ref)
    }
}

impl HasKeycloakRef for ClusterKeycloakRealm {
    fn keycloak_ref(&self) -> Result<InstanceRef> {
        Ok(InstanceRef::ClusterKeycloak {
            name: self.spec.cluster_keycloak_ref.clone(),
        })
    }
}
