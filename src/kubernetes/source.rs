// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of values given inline or through Secret / ConfigMap keys

use crate::error::{KeycloakError, Result, ResultExt};
use crate::types::source::ValueSource;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use tracing::instrument;

/// Resolve a value source in `namespace`. An absent source resolves to `None`.
#[instrument(skip(client, source))]
pub async fn resolve_value(
    client: &Client,
    source: Option<&ValueSource>,
    namespace: &str,
) -> Result<Option<String>> {
    let Some(source) = source else {
        return Ok(None);
    };

    if let Some(key_ref) = &source.secret_key_ref {
        let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
        let secret = secrets
            .get(&key_ref.name)
            .await
            .with_context(|| format!("unable to get secret {}/{}", namespace, key_ref.name))?;

        let value = secret
            .data
            .as_ref()
            .and_then(|d| d.get(&key_ref.key))
            .ok_or_else(|| {
                KeycloakError::SecretError(format!(
                    "Secret {}/{} does not contain '{}' key",
                    namespace, key_ref.name, key_ref.key
                ))
            })?;

        return String::from_utf8(value.0.clone()).map(Some).map_err(|e| {
            KeycloakError::SecretError(format!(
                "Failed to decode '{}' of secret {}/{}: {}",
                key_ref.key, namespace, key_ref.name, e
            ))
        });
    }

    if let Some(key_ref) = &source.config_map_key_ref {
        let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
        let config_map = config_maps
            .get(&key_ref.name)
            .await
            .with_context(|| format!("unable to get configmap {}/{}", namespace, key_ref.name))?;

        let value = config_map
            .data
            .as_ref()
            .and_then(|d| d.get(&key_ref.key))
            .ok_or_else(|| {
                KeycloakError::SecretError(format!(
                    "ConfigMap {}/{} does not contain '{}' key",
                    namespace, key_ref.name, key_ref.key
                ))
            })?;

        return Ok(Some(value.clone()));
    }

    Ok(source.value.clone())
}
