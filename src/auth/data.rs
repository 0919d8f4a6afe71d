// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of Keycloak connection parameters from parent references.
//!
//! A dependent points either at an instance directly or at a realm, which in turn
//! points at its instance. Only a missing *direct* parent of an object that is being
//! deleted yields [`KeycloakError::ParentNotFound`]; everything else that is missing
//! is an ordinary error.

use kube::api::ObjectMeta;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, instrument};

use crate::error::{KeycloakError, Result, ResultExt};
use crate::kubernetes::source::resolve_value;
use crate::types::{
    AdminType, ClusterKeycloak, ClusterKeycloakRealm, HasKeycloakRef, InstanceRef, Keycloak,
    KeycloakRealm, RealmRef,
};

/// Connection parameters of one Keycloak instance, built per reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthData {
    pub url: String,
    /// Secret with the admin `username` and `password`
    pub secret_name: String,
    /// Namespace of the credentials and of the cached session token
    pub secret_namespace: String,
    pub admin_type: AdminType,
    /// Name of the Keycloak resource, keys the token cache
    pub instance_name: String,
    pub ca_cert: Option<String>,
    pub insecure_skip_verify: bool,
}

pub struct AuthDataResolver {
    client: Client,
    operator_namespace: String,
}

impl AuthDataResolver {
    pub fn new(client: Client, operator_namespace: impl Into<String>) -> Self {
        Self {
            client,
            operator_namespace: operator_namespace.into(),
        }
    }

    /// Resolve from a dependent that points at an instance directly.
    #[instrument(skip(self, dependent), fields(dependent = dependent.name.as_deref()))]
    pub async fn from_instance_ref(
        &self,
        dependent: &ObjectMeta,
        instance: &InstanceRef,
    ) -> Result<AuthData> {
        self.instance_auth(
            instance,
            dependent.namespace.as_deref(),
            dependent.deletion_timestamp.is_some(),
        )
        .await
    }

    /// Resolve from a dependent that points at a realm.
    #[instrument(skip(self, dependent), fields(dependent = dependent.name.as_deref()))]
    pub async fn from_realm_ref(&self, dependent: &ObjectMeta, realm: &RealmRef) -> Result<AuthData> {
        let deleting = dependent.deletion_timestamp.is_some();

        match realm {
            RealmRef::KeycloakRealm { name } => {
                let namespace = namespace_for(dependent.namespace.as_deref(), realm.kind())?;
                let api: Api<KeycloakRealm> = Api::namespaced(self.client.clone(), namespace);
                let realm = fetch_parent(&api, name, realm.kind(), deleting)
                    .await
                    .context("unable to get realm")?;

                self.realm_auth(&realm, false).await
            }
            RealmRef::ClusterKeycloakRealm { name } => {
                let api: Api<ClusterKeycloakRealm> = Api::all(self.client.clone());
                let realm = fetch_parent(&api, name, realm.kind(), deleting)
                    .await
                    .context("unable to get cluster realm")?;

                self.cluster_realm_auth(&realm, false).await
            }
        }
    }

    /// Resolve for a realm, which is itself a dependent of its instance.
    #[instrument(skip(self, realm), fields(realm = realm.meta().name.as_deref()))]
    pub async fn from_realm(&self, realm: &KeycloakRealm) -> Result<AuthData> {
        self.realm_auth(realm, realm.meta().deletion_timestamp.is_some())
            .await
    }

    #[instrument(skip(self, realm), fields(realm = realm.meta().name.as_deref()))]
    pub async fn from_cluster_realm(&self, realm: &ClusterKeycloakRealm) -> Result<AuthData> {
        self.cluster_realm_auth(realm, realm.meta().deletion_timestamp.is_some())
            .await
    }

    async fn realm_auth(&self, realm: &KeycloakRealm, deleting: bool) -> Result<AuthData> {
        let instance = realm.keycloak_ref()?;
        self.instance_auth(&instance, realm.meta().namespace.as_deref(), deleting)
            .await
    }

    async fn cluster_realm_auth(&self, realm: &ClusterKeycloakRealm, deleting: bool) -> Result<AuthData> {
        let instance = realm.keycloak_ref()?;
        self.instance_auth(&instance, None, deleting).await
    }

    async fn instance_auth(
        &self,
        instance: &InstanceRef,
        namespace: Option<&str>,
        deleting: bool,
    ) -> Result<AuthData> {
        match instance {
            InstanceRef::Keycloak { name } => {
                let namespace = namespace_for(namespace, instance.kind())?;
                let api: Api<Keycloak> = Api::namespaced(self.client.clone(), namespace);
                let kc = fetch_parent(&api, name, instance.kind(), deleting)
                    .await
                    .context("unable to get keycloak")?;

                if !kc.is_connected() {
                    debug!("Keycloak {}/{} is not connected", namespace, name);
                    return Err(KeycloakError::NotAvailable);
                }

                let ca_cert = resolve_value(&self.client, kc.spec.ca_cert.as_ref(), namespace)
                    .await
                    .context("unable to get ca cert")?;

                Ok(AuthData {
                    url: kc.spec.url.clone(),
                    secret_name: kc.spec.secret.clone(),
                    secret_namespace: namespace.to_string(),
                    admin_type: kc.admin_type(),
                    instance_name: name.clone(),
                    ca_cert,
                    insecure_skip_verify: kc.spec.insecure_skip_verify,
                })
            }
            InstanceRef::ClusterKeycloak { name } => {
                let api: Api<ClusterKeycloak> = Api::all(self.client.clone());
                let kc = fetch_parent(&api, name, instance.kind(), deleting)
                    .await
                    .context("unable to get cluster keycloak")?;

                if !kc.is_connected() {
                    debug!("ClusterKeycloak {} is not connected", name);
                    return Err(KeycloakError::NotAvailable);
                }

                let ca_cert = resolve_value(
                    &self.client,
                    kc.spec.ca_cert.as_ref(),
                    &self.operator_namespace,
                )
                .await
                .context("unable to get ca cert")?;

                Ok(AuthData {
                    url: kc.spec.url.clone(),
                    secret_name: kc.spec.secret.clone(),
                    secret_namespace: self.operator_namespace.clone(),
                    admin_type: kc.admin_type(),
                    instance_name: name.clone(),
                    ca_cert,
                    insecure_skip_verify: kc.spec.insecure_skip_verify,
                })
            }
        }
    }
}

pub(crate) fn namespace_for<'a>(namespace: Option<&'a str>, kind: &str) -> Result<&'a str> {
    namespace.filter(|ns| !ns.is_empty()).ok_or_else(|| {
        KeycloakError::InvalidReference(format!(
            "namespaced {} referenced from a cluster-scoped resource",
            kind
        ))
    })
}

/// Get a directly referenced parent. A missing parent of a dependent that is being
/// deleted is reported as [`KeycloakError::ParentNotFound`].
async fn fetch_parent<K>(api: &Api<K>, name: &str, kind: &str, deleting: bool) -> Result<K>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.get(name).await {
        Ok(obj) => Ok(obj),
        Err(kube::Error::Api(err)) if err.code == 404 && deleting => {
            Err(KeycloakError::ParentNotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
