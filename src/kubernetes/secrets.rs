// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admin credentials and cached session token secrets

use crate::constants::{credentials, token};
use crate::error::{KeycloakError, Result, ResultExt};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{DeleteParams, ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, instrument};

/// Login credentials of a Keycloak admin user or service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read `username` and `password` from the admin credentials secret.
#[instrument(skip(client))]
pub async fn get_credentials(client: &Client, name: &str, namespace: &str) -> Result<Credentials> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = secrets
        .get(name)
        .await
        .with_context(|| format!("secret {}/{} not found", namespace, name))?;

    let Some(data) = secret.data.as_ref() else {
        return Err(KeycloakError::SecretError(format!(
            "Credentials secret {}/{} has no data",
            namespace, name
        )));
    };

    let read = |key: &str| -> Result<String> {
        let value = data.get(key).ok_or_else(|| {
            KeycloakError::SecretError(format!(
                "Credentials secret {}/{} does not contain '{}' key",
                namespace, name, key
            ))
        })?;
        String::from_utf8(value.0.clone()).map_err(|e| {
            KeycloakError::SecretError(format!(
                "Failed to decode '{}' of secret {}/{}: {}",
                key, namespace, name, e
            ))
        })
    };

    Ok(Credentials {
        username: read(credentials::USERNAME)?,
        password: read(credentials::PASSWORD)?,
    })
}

/// Persists one exported admin session per Keycloak instance.
#[derive(Clone)]
pub struct TokenStore {
    client: Client,
}

impl TokenStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Name of the token secret for a Keycloak instance
    pub fn secret_name(instance: &str) -> String {
        format!("{}{}", token::SECRET_PREFIX, instance)
    }

    /// Load the cached session blob, `None` when nothing was cached yet
    #[instrument(skip(self))]
    pub async fn get(&self, instance: &str, namespace: &str) -> Result<Option<Vec<u8>>> {
        let name = Self::secret_name(instance);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let Some(secret) = secrets
            .get_opt(&name)
            .await
            .context("unable to get token secret")?
        else {
            debug!("Token secret {}/{} does not exist", namespace, name);
            return Ok(None);
        };

        let blob = secret
            .data
            .as_ref()
            .and_then(|d| d.get(token::SECRET_KEY))
            .ok_or_else(|| {
                KeycloakError::SecretError(format!(
                    "Token secret {}/{} does not contain '{}' key",
                    namespace,
                    name,
                    token::SECRET_KEY
                ))
            })?;

        Ok(Some(blob.0.clone()))
    }

    /// Store the session blob, updating the secret in place when it already exists
    #[instrument(skip(self, blob))]
    pub async fn save(&self, instance: &str, namespace: &str, blob: &[u8]) -> Result<()> {
        let name = Self::secret_name(instance);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let data = BTreeMap::from([(token::SECRET_KEY.to_string(), ByteString(blob.to_vec()))]);

        match secrets
            .get_opt(&name)
            .await
            .context("error during token secret retrieval")?
        {
            Some(mut secret) => {
                secret.data = Some(data);
                secrets
                    .replace(&name, &PostParams::default(), &secret)
                    .await
                    .context("unable to update token secret")?;
                debug!("Token secret {}/{} updated", namespace, name);
            }
            None => {
                let secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(name.clone()),
                        namespace: Some(namespace.to_string()),
                        ..Default::default()
                    },
                    data: Some(data),
                    ..Default::default()
                };
                secrets
                    .create(&PostParams::default(), &secret)
                    .await
                    .context("unable to create token secret")?;
                info!("Token secret {}/{} created", namespace, name);
            }
        }

        Ok(())
    }

    /// Drop the cached session so the next client is built from a fresh login.
    /// Returns whether a secret was actually removed.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, instance: &str, namespace: &str) -> Result<bool> {
        let name = Self::secret_name(instance);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        match secrets.delete(&name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Token secret {}/{} invalidated", namespace, name);
                Ok(true)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Token secret {}/{} already gone", namespace, name);
                Ok(false)
            }
            Err(e) => Err(e).context("unable to delete client token secret"),
        }
    }
}
