// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Everything a resource controller needs from the operator core, in one place.

use kube::api::ObjectMeta;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::data::namespace_for;
use crate::auth::{AdminClientBuilder, AuthDataResolver, ClientFactory};
use crate::backoff::FailureBackoff;
use crate::config::Config;
use crate::deletion::{self, DeletionOutcome, Terminator};
use crate::error::{Result, ResultExt};
use crate::ownership::OwnerRefResolver;
use crate::types::{
    ClusterKeycloakRealm, InstanceRef, KeycloakRealm, ParentRef, RealmRef, ReconcileStatus,
};

/// Shared by all controllers of one operator. The [`ClientFactory`] is shared between
/// helpers so that every controller goes through the same login lock.
pub struct Helper<B> {
    client: Client,
    config: Config,
    factory: Arc<ClientFactory<B>>,
    resolver: AuthDataResolver,
    owners: OwnerRefResolver,
    backoff: FailureBackoff,
}

impl<B: AdminClientBuilder> Helper<B> {
    pub fn new(client: Client, config: Config, factory: Arc<ClientFactory<B>>) -> Self {
        Self {
            resolver: AuthDataResolver::new(client.clone(), config.operator_namespace.clone()),
            owners: OwnerRefResolver::new(client.clone(), config.owner_references),
            backoff: FailureBackoff::default(),
            client,
            config,
            factory,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn client_from_realm_ref(
        &self,
        dependent: &ObjectMeta,
        realm: &RealmRef,
    ) -> Result<B::Client> {
        let auth = self.resolver.from_realm_ref(dependent, realm).await?;
        self.factory.client(&auth).await
    }

    pub async fn client_from_instance_ref(
        &self,
        dependent: &ObjectMeta,
        instance: &InstanceRef,
    ) -> Result<B::Client> {
        let auth = self.resolver.from_instance_ref(dependent, instance).await?;
        self.factory.client(&auth).await
    }

    pub async fn client_from_realm(&self, realm: &KeycloakRealm) -> Result<B::Client> {
        let auth = self.resolver.from_realm(realm).await?;
        self.factory.client(&auth).await
    }

    pub async fn client_from_cluster_realm(&self, realm: &ClusterKeycloakRealm) -> Result<B::Client> {
        let auth = self.resolver.from_cluster_realm(realm).await?;
        self.factory.client(&auth).await
    }

    /// Client for whatever kind of parent `dependent` has.
    pub async fn client_for(&self, dependent: &ObjectMeta, parent: &ParentRef) -> Result<B::Client> {
        match parent {
            ParentRef::Instance(instance) => self.client_from_instance_ref(dependent, instance).await,
            ParentRef::Realm(realm) => self.client_from_realm_ref(dependent, realm).await,
        }
    }

    /// Drop the cached session of an instance, e.g. after its credentials changed.
    /// `namespace` is the namespace of a namespaced `Keycloak`.
    pub async fn invalidate_token(&self, instance: &InstanceRef, namespace: Option<&str>) -> Result<bool> {
        let secret_namespace = match instance {
            InstanceRef::Keycloak { .. } => namespace_for(namespace, instance.kind())?,
            InstanceRef::ClusterKeycloak { .. } => self.config.operator_namespace.as_str(),
        };

        self.factory
            .tokens()
            .invalidate(instance.name(), secret_namespace)
            .await
    }

    /// Name of the Keycloak realm behind a realm reference
    pub async fn realm_name_from_ref(&self, dependent: &ObjectMeta, realm: &RealmRef) -> Result<String> {
        match realm {
            RealmRef::KeycloakRealm { name } => {
                let namespace = namespace_for(dependent.namespace.as_deref(), realm.kind())?;
                let api: Api<KeycloakRealm> = Api::namespaced(self.client.clone(), namespace);
                let realm = api.get(name).await.context("failed to get KeycloakRealm")?;
                Ok(realm.spec.realm_name)
            }
            RealmRef::ClusterKeycloakRealm { name } => {
                let api: Api<ClusterKeycloakRealm> = Api::all(self.client.clone());
                let realm = api
                    .get(name)
                    .await
                    .context("failed to get ClusterKeycloakRealm")?;
                Ok(realm.spec.realm_name)
            }
        }
    }

    pub async fn set_owner<K>(&self, api: &Api<K>, child: &mut K, parent: &ParentRef) -> Result<()>
    where
        K: Resource + Clone + Serialize + DeserializeOwned + Debug,
    {
        self.owners.set_owner(api, child, parent).await
    }

    pub async fn try_to_delete<K, T>(
        &self,
        api: &Api<K>,
        obj: &mut K,
        terminator: &T,
        finalizer: &str,
    ) -> Result<DeletionOutcome>
    where
        K: Resource + Clone + Serialize + DeserializeOwned + Debug,
        T: Terminator + ?Sized,
    {
        deletion::try_to_delete(api, obj, terminator, finalizer).await
    }

    pub async fn remove_finalizer<K>(&self, api: &Api<K>, obj: &mut K, finalizer: &str) -> Result<()>
    where
        K: Resource + Clone + Serialize + DeserializeOwned + Debug,
    {
        deletion::remove_finalizer(api, obj, finalizer).await
    }

    pub fn next_delay(&self, status: &mut impl ReconcileStatus) -> Duration {
        self.backoff.next_delay(status)
    }

    pub fn set_success(&self, status: &mut impl ReconcileStatus) {
        self.backoff.reset_on_success(status)
    }
}
