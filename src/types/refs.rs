// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! References from dependents to their Keycloak or realm parent.
//!
//! Specs carry a loose `{kind, name}` pair. It is parsed into a closed enum as soon as
//! it is read, so everything past this module dispatches with an exhaustive match and
//! an unsupported kind is rejected exactly once, with the offending string.

use serde::{Deserialize, Serialize};

use crate::constants::kinds;
use crate::error::{KeycloakError, RefFamily, Result};

/// A `{kind, name}` reference as written in a resource spec.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct RefSpec {
    pub kind: String,
    pub name: String,
}

impl RefSpec {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Reference to a Keycloak instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstanceRef {
    /// `Keycloak` in the dependent's namespace
    Keycloak { name: String },
    /// Cluster-scoped `ClusterKeycloak`
    ClusterKeycloak { name: String },
}

impl InstanceRef {
    pub fn name(&self) -> &str {
        match self {
            InstanceRef::Keycloak { name } | InstanceRef::ClusterKeycloak { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InstanceRef::Keycloak { .. } => kinds::KEYCLOAK,
            InstanceRef::ClusterKeycloak { .. } => kinds::CLUSTER_KEYCLOAK,
        }
    }
}

impl TryFrom<&RefSpec> for InstanceRef {
    type Error = KeycloakError;

    fn try_from(spec: &RefSpec) -> Result<Self> {
        let name = spec.name.clone();
        match spec.kind.as_str() {
            kinds::KEYCLOAK => Ok(InstanceRef::Keycloak { name }),
            kinds::CLUSTER_KEYCLOAK => Ok(InstanceRef::ClusterKeycloak { name }),
            other => Err(KeycloakError::unknown_kind(RefFamily::Keycloak, other)),
        }
    }
}

/// Reference to a realm resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RealmRef {
    /// `KeycloakRealm` in the dependent's namespace
    KeycloakRealm { name: String },
    /// Cluster-scoped `ClusterKeycloakRealm`
    ClusterKeycloakRealm { name: String },
}

impl RealmRef {
    pub fn name(&self) -> &str {
        match self {
            RealmRef::KeycloakRealm { name } | RealmRef::ClusterKeycloakRealm { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RealmRef::KeycloakRealm { .. } => kinds::KEYCLOAK_REALM,
            RealmRef::ClusterKeycloakRealm { .. } => kinds::CLUSTER_KEYCLOAK_REALM,
        }
    }
}

impl TryFrom<&RefSpec> for RealmRef {
    type Error = KeycloakError;

    fn try_from(spec: &RefSpec) -> Result<Self> {
        let name = spec.name.clone();
        match spec.kind.as_str() {
            kinds::KEYCLOAK_REALM => Ok(RealmRef::KeycloakRealm { name }),
            kinds::CLUSTER_KEYCLOAK_REALM => Ok(RealmRef::ClusterKeycloakRealm { name }),
            other => Err(KeycloakError::unknown_kind(RefFamily::Realm, other)),
        }
    }
}

/// The parent a dependent authenticates through and is owned by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    Instance(InstanceRef),
    Realm(RealmRef),
}

impl ParentRef {
    pub fn name(&self) -> &str {
        match self {
            ParentRef::Instance(r) => r.name(),
            ParentRef::Realm(r) => r.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParentRef::Instance(r) => r.kind(),
            ParentRef::Realm(r) => r.kind(),
        }
    }
}

impl From<InstanceRef> for ParentRef {
    fn from(r: InstanceRef) -> Self {
        ParentRef::Instance(r)
    }
}

impl From<RealmRef> for ParentRef {
    fn from(r: RealmRef) -> Self {
        ParentRef::Realm(r)
    }
}

/// Resources that point at a Keycloak instance.
pub trait HasKeycloakRef {
    fn keycloak_ref(&self) -> Result<InstanceRef>;
}

/// Resources that point at a realm.
pub trait HasRealmRef {
    fn realm_ref(&self) -> Result<RealmRef>;
}
