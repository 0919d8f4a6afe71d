// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::types::source::ValueSource;

/// How the operator authenticates against the admin API.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum AdminType {
    /// Password grant with the credentials of an admin user
    #[default]
    #[serde(rename = "user")]
    User,
    /// Client credentials grant, `username` is the client id
    #[serde(rename = "serviceAccount")]
    ServiceAccount,
}

/// Connection to a Keycloak instance, visible in its own namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "keycloak.geeko.me",
    version = "v1",
    kind = "Keycloak",
    plural = "keycloaks"
)]
#[kube(namespaced)]
#[kube(status = "KeycloakStatus")]
#[serde(rename_all = "camelCase")]
pub struct KeycloakSpec {
    pub url: String,
    /// Name of the secret with `username` and `password`
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_type: Option<AdminType>,
    /// Root CA the admin client trusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<ValueSource>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// Connection to a Keycloak instance usable from every namespace.
/// Its secrets live in the operator namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "keycloak.geeko.me",
    version = "v1",
    kind = "ClusterKeycloak",
    plural = "clusterkeycloaks"
)]
#[kube(status = "KeycloakStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterKeycloakSpec {
    pub url: String,
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_type: Option<AdminType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<ValueSource>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakStatus {
    /// Set by the instance controller once the admin API answered
    #[serde(default)]
    pub connected: bool,
}

impl Keycloak {
    pub fn is_connected(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.connected)
    }

    pub fn admin_type(&self) -> AdminType {
        self.spec.admin_type.unwrap_or_default()
    }
}

impl ClusterKeycloak {
    pub fn is_connected(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.connected)
    }

    pub fn admin_type(&self) -> AdminType {
        self.spec.admin_type.unwrap_or_default()
    }
}
