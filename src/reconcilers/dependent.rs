// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic reconciler for resources that are synced into Keycloak.
//!
//! A reconciliation links the owner, gets an admin client, runs the deletion protocol
//! and finally hands over to the resource specific [`Synchronizer`]. The outcome is
//! written to the status together with the failure counter driving the retry delay.

use async_trait::async_trait;
use futures::StreamExt;
use kube::api::{Patch, PatchParams};
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::{reflector, watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{AdminClient, AdminClientBuilder};
use crate::constants::requeue;
use crate::deletion::{DeletionOutcome, PreservingTerminator, Terminator};
use crate::error::{ErrorKind, KeycloakError, Result, ResultExt};
use crate::helper::Helper;
use crate::kubernetes::wait_for_crds;
use crate::types::{ParentRef, ReconcileStatus};

/// A resource that needs an authenticated admin client to reconcile itself.
pub trait Dependent:
    Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
    /// Finalizer guarding the remote cleanup
    const FINALIZER: &'static str;

    type Status: ReconcileStatus + Serialize + Send + Sync;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;

    fn parent_ref(&self) -> Result<ParentRef>;

    fn status(&self) -> Option<&Self::Status>;

    fn status_mut(&mut self) -> &mut Self::Status;
}

/// What a synchronizer gets to talk to Keycloak.
pub struct SyncContext<'a, C> {
    pub client: &'a C,
    /// Keycloak realm name, for resources living in a realm
    pub realm_name: Option<&'a str>,
}

/// The resource specific half of a controller.
#[async_trait]
pub trait Synchronizer<K: Dependent, C: AdminClient>: Send + Sync + 'static {
    /// Bring the remote resource in line with `obj`. Remote ids may be recorded in the
    /// status of `obj`, which is written after this returns.
    async fn sync(&self, obj: &mut K, ctx: &SyncContext<'_, C>) -> Result<()>;

    /// Delete the remote resource. Must succeed when it is already gone.
    async fn delete(&self, obj: &K, ctx: &SyncContext<'_, C>) -> Result<()>;
}

struct SyncTerminator<'a, K, C, S> {
    synchronizer: &'a S,
    obj: &'a K,
    ctx: &'a SyncContext<'a, C>,
}

#[async_trait]
impl<K, C, S> Terminator for SyncTerminator<'_, K, C, S>
where
    K: Dependent,
    C: AdminClient,
    S: Synchronizer<K, C>,
{
    async fn delete_resource(&self) -> Result<()> {
        self.synchronizer.delete(self.obj, self.ctx).await
    }
}

enum Step {
    /// Nothing to record, wait for the next change
    Stop,
    /// Keycloak is not ready, look again later without touching the status
    Revisit(Duration),
    Synced,
}

pub struct DependentReconciler<K, B, S> {
    helper: Helper<B>,
    pub(crate) synchronizer: S,
    _resource: PhantomData<fn() -> K>,
}

impl<K, B, S> DependentReconciler<K, B, S>
where
    K: Dependent,
    B: AdminClientBuilder,
    S: Synchronizer<K, B::Client>,
{
    pub fn new(helper: Helper<B>, synchronizer: S) -> Self {
        Self {
            helper,
            synchronizer,
            _resource: PhantomData,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let client = self.helper.client().clone();
        let kind = K::kind(&());
        wait_for_crds(&client, &[kind.as_ref()]).await?;

        let api: Api<K> = Api::all(client);
        let (reader, writer) = reflector::store();
        let objects = watcher(api, watcher::Config::default())
            .default_backoff()
            .reflect(writer)
            .applied_objects()
            .predicate_filter(reconcile_trigger::<K>);
        let context = Arc::new(self);

        info!("Starting {} reconciler", kind);
        Controller::for_stream(objects, reader)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Reconcile `obj` once. The work up to the status write is bounded by the configured
    /// reconcile timeout; running out of time counts as a failure.
    #[instrument(skip_all, fields(kind = %K::kind(&()), name = %obj.name_any(), namespace = obj.meta().namespace.as_deref()))]
    pub async fn reconcile_once(&self, mut obj: K) -> Result<Action> {
        let api = K::api(self.helper.client().clone(), obj.meta().namespace.as_deref());
        let timeout = self.helper.config().reconcile_timeout;
        let outcome = tokio::time::timeout(timeout, self.try_reconcile(&api, &mut obj))
            .await
            .unwrap_or_else(|_| Err(KeycloakError::Timeout(timeout)));

        let action = match outcome {
            Ok(Step::Stop) => return Ok(Action::await_change()),
            Ok(Step::Revisit(delay)) => return Ok(Action::requeue(delay)),
            Ok(Step::Synced) => {
                self.helper.set_success(obj.status_mut());
                match self.helper.config().success_reconcile_timeout {
                    Some(delay) => Action::requeue(delay),
                    None => Action::await_change(),
                }
            }
            Err(e) => {
                error!("An error has occurred while handling {}: {}", obj.name_any(), e);
                let status = obj.status_mut();
                status.set_value(e.to_string());
                Action::requeue(self.helper.next_delay(status))
            }
        };

        write_status(&api, &obj).await?;
        debug!("Reconciling done");
        Ok(action)
    }

    async fn try_reconcile(&self, api: &Api<K>, obj: &mut K) -> Result<Step> {
        let parent = obj.parent_ref()?;

        if obj.meta().deletion_timestamp.is_none() {
            self.helper
                .set_owner(api, obj, &parent)
                .await
                .context("unable to set owner ref")?;
        }

        let client = match self.helper.client_for(obj.meta(), &parent).await {
            Ok(client) => client,
            Err(e) if e.kind() == ErrorKind::NotAvailable => {
                info!("Keycloak is not available, revisiting later");
                return Ok(Step::Revisit(Duration::from_secs(
                    requeue::NOT_AVAILABLE_SECS,
                )));
            }
            Err(e) if e.kind() == ErrorKind::ParentNotFound => {
                info!("{}, removing finalizer", e);
                self.helper
                    .remove_finalizer(api, obj, K::FINALIZER)
                    .await
                    .context("unable to remove finalizer")?;
                return Ok(Step::Stop);
            }
            Err(e) => return Err(e).context("unable to create keycloak client"),
        };

        let realm_name = match &parent {
            ParentRef::Realm(realm) => Some(
                self.helper
                    .realm_name_from_ref(obj.meta(), realm)
                    .await
                    .context("unable to get realm name from ref")?,
            ),
            ParentRef::Instance(_) => None,
        };
        let ctx = SyncContext {
            client: &client,
            realm_name: realm_name.as_deref(),
        };

        let snapshot = obj.clone();
        let terminator = PreservingTerminator::new(
            SyncTerminator {
                synchronizer: &self.synchronizer,
                obj: &snapshot,
                ctx: &ctx,
            },
            snapshot.meta(),
        );
        match self
            .helper
            .try_to_delete(api, obj, &terminator, K::FINALIZER)
            .await
            .context("failed to delete keycloak resource")?
        {
            DeletionOutcome::MarkerAdded | DeletionOutcome::Deleted => return Ok(Step::Stop),
            DeletionOutcome::Active => {}
        }

        self.synchronizer.sync(obj, &ctx).await?;
        Ok(Step::Synced)
    }
}

/// Hash of the object fields a reconciliation reacts to: generation, labels, annotations,
/// finalizers, owners and the deletion mark. Status writes leave it unchanged, so the
/// reconciler's own status patches do not cut the requeue delay short.
pub fn reconcile_trigger<K: Resource>(obj: &K) -> Option<u64> {
    let meta = obj.meta();
    let mut hasher = DefaultHasher::new();
    meta.generation.hash(&mut hasher);
    meta.labels.hash(&mut hasher);
    meta.annotations.hash(&mut hasher);
    meta.finalizers.hash(&mut hasher);
    meta.owner_references
        .iter()
        .flatten()
        .for_each(|owner| owner.uid.hash(&mut hasher));
    meta.deletion_timestamp.is_some().hash(&mut hasher);
    Some(hasher.finish())
}

async fn write_status<K: Dependent>(api: &Api<K>, obj: &K) -> Result<()> {
    let patch = serde_json::json!({ "status": obj.status() });
    api.patch_status(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .context("unable to update status")?;
    Ok(())
}

async fn reconcile<K, B, S>(obj: Arc<K>, ctx: Arc<DependentReconciler<K, B, S>>) -> Result<Action>
where
    K: Dependent,
    B: AdminClientBuilder,
    S: Synchronizer<K, B::Client>,
{
    ctx.reconcile_once((*obj).clone()).await
}

fn error_policy<K, B, S>(
    obj: Arc<K>,
    error: &KeycloakError,
    _ctx: Arc<DependentReconciler<K, B, S>>,
) -> Action
where
    K: Dependent,
{
    error!("Reconciliation of {} failed: {}", obj.name_any(), error);
    Action::requeue(Duration::from_secs(60))
}
