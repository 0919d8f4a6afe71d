// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer based deletion of remote Keycloak resources.
//!
//! The finalizer is written before any cleanup is attempted and only removed once the
//! terminator succeeded, so a failed cleanup is retried on the next reconciliation.
//! The remote delete itself may therefore run more than once.

use async_trait::async_trait;
use kube::api::{ObjectMeta, PostParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, instrument};

use crate::constants::annotations;
use crate::error::{Result, ResultExt};

/// What the reconciliation should do after [`try_to_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The finalizer was just added; stop this cycle.
    MarkerAdded,
    /// Not being deleted; continue with the normal sync.
    Active,
    /// Cleanup is done or was never needed; stop.
    Deleted,
}

/// Deletes the remote counterpart of a resource.
#[async_trait]
pub trait Terminator: Send + Sync {
    /// Must succeed when the remote resource is already gone.
    async fn delete_resource(&self) -> Result<()>;
}

/// Skips the remote delete of resources annotated to keep them.
pub struct PreservingTerminator<T> {
    inner: T,
    preserve: bool,
}

impl<T: Terminator> PreservingTerminator<T> {
    pub fn new(inner: T, meta: &ObjectMeta) -> Self {
        Self {
            inner,
            preserve: preserve_resources_on_deletion(meta),
        }
    }
}

#[async_trait]
impl<T: Terminator> Terminator for PreservingTerminator<T> {
    async fn delete_resource(&self) -> Result<()> {
        if self.preserve {
            info!("Preserving remote resource on deletion");
            return Ok(());
        }
        self.inner.delete_resource().await
    }
}

pub fn preserve_resources_on_deletion(meta: &ObjectMeta) -> bool {
    meta.annotations
        .as_ref()
        .and_then(|a| a.get(annotations::PRESERVE_RESOURCES_ON_DELETION))
        .is_some_and(|v| v == "true")
}

fn has_finalizer<K: Resource>(obj: &K, finalizer: &str) -> bool {
    obj.finalizers().iter().any(|f| f == finalizer)
}

/// Drive the deletion protocol of `obj` one step. `obj` is updated to the stored
/// object whenever it is written.
#[instrument(skip_all, fields(name = %obj.name_any(), finalizer = finalizer))]
pub async fn try_to_delete<K, T>(
    api: &Api<K>,
    obj: &mut K,
    terminator: &T,
    finalizer: &str,
) -> Result<DeletionOutcome>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
    T: Terminator + ?Sized,
{
    let marked = has_finalizer(obj, finalizer);

    if obj.meta().deletion_timestamp.is_none() {
        if marked {
            return Ok(DeletionOutcome::Active);
        }

        let mut updated = obj.clone();
        updated.finalizers_mut().push(finalizer.to_string());
        *obj = api
            .replace(&obj.name_any(), &PostParams::default(), &updated)
            .await
            .context("unable to add finalizer")?;
        debug!("Finalizer added");
        return Ok(DeletionOutcome::MarkerAdded);
    }

    if !marked {
        debug!("Finalizer already removed, nothing to clean up");
        return Ok(DeletionOutcome::Deleted);
    }

    info!("Terminator deleting remote resource");
    terminator
        .delete_resource()
        .await
        .context("unable to delete remote resource")?;

    release(api, obj, finalizer).await?;
    info!("Terminator deleting remote resource done");

    Ok(DeletionOutcome::Deleted)
}

/// Remove the finalizer without any cleanup, for resources whose parent is gone.
#[instrument(skip_all, fields(name = %obj.name_any(), finalizer = finalizer))]
pub async fn remove_finalizer<K>(api: &Api<K>, obj: &mut K, finalizer: &str) -> Result<()>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    if !has_finalizer(obj, finalizer) {
        return Ok(());
    }

    release(api, obj, finalizer).await?;
    info!("Finalizer removed without cleanup");
    Ok(())
}

async fn release<K>(api: &Api<K>, obj: &mut K, finalizer: &str) -> Result<()>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    let mut updated = obj.clone();
    updated.finalizers_mut().retain(|f| f != finalizer);
    *obj = api
        .replace(&obj.name_any(), &PostParams::default(), &updated)
        .await
        .context("unable to remove finalizer")?;
    Ok(())
}
