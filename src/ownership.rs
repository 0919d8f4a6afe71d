// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller owner references from dependents to their Keycloak or realm.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::PostParams;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, instrument};

use crate::error::{KeycloakError, Result, ResultExt};
use crate::types::{
    ClusterKeycloak, ClusterKeycloakRealm, InstanceRef, Keycloak, KeycloakRealm, ParentRef,
    RealmRef,
};

pub struct OwnerRefResolver {
    client: Client,
    enabled: bool,
}

impl OwnerRefResolver {
    pub fn new(client: Client, enabled: bool) -> Self {
        Self { client, enabled }
    }

    /// Make `parent` the controller of `child` and persist it.
    ///
    /// Does nothing when `child` already has a controller. On success `child` is
    /// replaced by the stored object; on failure it is left untouched.
    #[instrument(skip_all, fields(child = %child.name_any(), parent = parent.name()))]
    pub async fn set_owner<K>(&self, api: &Api<K>, child: &mut K, parent: &ParentRef) -> Result<()>
    where
        K: Resource + Clone + Serialize + DeserializeOwned + Debug,
    {
        if !self.enabled {
            return Ok(());
        }
        if has_controller(child) {
            debug!("Owner reference already set");
            return Ok(());
        }

        let namespace = child.meta().namespace.as_deref();
        let owner = match parent {
            ParentRef::Instance(InstanceRef::Keycloak { name }) => {
                let api: Api<Keycloak> =
                    Api::namespaced(self.client.clone(), owner_namespace(namespace, parent)?);
                controller_of(&api, name).await?
            }
            ParentRef::Instance(InstanceRef::ClusterKeycloak { name }) => {
                controller_of(&Api::<ClusterKeycloak>::all(self.client.clone()), name).await?
            }
            ParentRef::Realm(RealmRef::KeycloakRealm { name }) => {
                let api: Api<KeycloakRealm> =
                    Api::namespaced(self.client.clone(), owner_namespace(namespace, parent)?);
                controller_of(&api, name).await?
            }
            ParentRef::Realm(RealmRef::ClusterKeycloakRealm { name }) => {
                controller_of(&Api::<ClusterKeycloakRealm>::all(self.client.clone()), name).await?
            }
        };

        let mut owned = child.clone();
        owned.owner_references_mut().push(owner);
        *child = api
            .replace(&child.name_any(), &PostParams::default(), &owned)
            .await
            .context("unable to set owner reference")?;

        info!("Owner reference set to {} {}", parent.kind(), parent.name());
        Ok(())
    }
}

fn has_controller<K: Resource>(obj: &K) -> bool {
    obj.owner_references()
        .iter()
        .any(|r| r.controller == Some(true))
}

fn owner_namespace<'a>(namespace: Option<&'a str>, parent: &ParentRef) -> Result<&'a str> {
    namespace.ok_or_else(|| {
        KeycloakError::InvalidReference(format!(
            "cluster-scoped resource cannot be owned by {} {}",
            parent.kind(),
            parent.name()
        ))
    })
}

async fn controller_of<P>(api: &Api<P>, name: &str) -> Result<OwnerReference>
where
    P: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let parent = api
        .get(name)
        .await
        .with_context(|| format!("unable to get owner {}", name))?;

    parent.controller_owner_ref(&()).ok_or_else(|| {
        KeycloakError::OwnerRefError(format!("owner {} has no uid yet", name))
    })
}
