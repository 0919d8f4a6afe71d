// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API, resource fixtures and a fake admin client.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Api, Client, CustomResource, Resource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::Service;

use crate::auth::{AdminClient, AdminClientBuilder, AuthData, ClientFactory, SessionToken};
use crate::config::Config;
use crate::error::{KeycloakError, Result};
use crate::kubernetes::secrets::Credentials;
use crate::helper::Helper;
use crate::reconcilers::{Dependent, DependentReconciler, SyncContext, Synchronizer};
use crate::types::keycloak::{ClusterKeycloakSpec, KeycloakSpec, KeycloakStatus};
use crate::types::realm::{ClusterKeycloakRealmSpec, KeycloakRealmSpec};
use crate::types::{
    ClusterKeycloak, ClusterKeycloakRealm, HasRealmRef, Keycloak, KeycloakRealm, ParentRef,
    RealmRef, RefSpec, SyncStatus,
};

#[derive(Default)]
struct MockState {
    objects: BTreeMap<String, Value>,
    failures: HashMap<(String, String), (u16, String)>,
    requests: Vec<(String, String)>,
    next_uid: u64,
}

impl MockState {
    fn assign_uid(&mut self, obj: &mut Value) {
        if obj.pointer("/metadata/uid").is_some_and(|v| !v.is_null()) {
            return;
        }
        self.next_uid += 1;
        obj["metadata"]["uid"] = json!(format!("uid-{}", self.next_uid));
    }

    fn handle(&mut self, method: &str, path: &str, body: &[u8]) -> (u16, Value) {
        self.requests.push((method.to_string(), path.to_string()));

        if let Some((code, message)) = self.failures.get(&(method.to_string(), path.to_string())) {
            return (*code, status_json(*code, message));
        }

        let parse = || serde_json::from_slice::<Value>(body);

        match method {
            "GET" => match self.objects.get(path) {
                Some(obj) => (200, obj.clone()),
                None => (404, status_json(404, &format!("{} not found", path))),
            },
            "POST" => {
                let Ok(mut obj) = parse() else {
                    return (400, status_json(400, "invalid body"));
                };
                let name = obj
                    .pointer("/metadata/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let key = format!("{}/{}", path, name);
                if self.objects.contains_key(&key) {
                    return (409, status_json(409, &format!("{} already exists", key)));
                }
                self.assign_uid(&mut obj);
                self.objects.insert(key, obj.clone());
                (201, obj)
            }
            "PUT" => {
                let Some(existing) = self.objects.get(path) else {
                    return (404, status_json(404, &format!("{} not found", path)));
                };
                let Ok(mut obj) = parse() else {
                    return (400, status_json(400, "invalid body"));
                };
                obj["metadata"]["uid"] = existing["metadata"]["uid"].clone();
                if is_released(&obj) {
                    self.objects.remove(path);
                } else {
                    self.objects.insert(path.to_string(), obj.clone());
                }
                (200, obj)
            }
            "PATCH" => {
                let key = path.strip_suffix("/status").unwrap_or(path);
                let Ok(patch) = parse() else {
                    return (400, status_json(400, "invalid body"));
                };
                let Some(obj) = self.objects.get_mut(key) else {
                    return (404, status_json(404, &format!("{} not found", key)));
                };
                merge_patch(obj, &patch);
                (200, obj.clone())
            }
            "DELETE" => match self.objects.remove(path) {
                Some(obj) => (200, obj),
                None => (404, status_json(404, &format!("{} not found", path))),
            },
            _ => (405, status_json(405, "method not allowed")),
        }
    }
}

/// An object marked for deletion whose last finalizer is gone is dropped by the API server.
fn is_released(obj: &Value) -> bool {
    let deleting = obj
        .pointer("/metadata/deletionTimestamp")
        .is_some_and(|v| !v.is_null());
    let finalizers = obj
        .pointer("/metadata/finalizers")
        .and_then(Value::as_array)
        .is_some_and(|f| !f.is_empty());
    deleting && !finalizers
}

fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = json!({});
    }
    if let Value::Object(target) = target {
        for (key, value) in fields {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn status_json(code: u16, message: &str) -> Value {
    let reason = match code {
        404 => "NotFound",
        409 => "AlreadyExists",
        _ => "InternalError",
    };
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

/// A stateful in-memory Kubernetes API server.
///
/// Objects are stored as JSON under their REST path. Create, get, replace, merge patch
/// and delete behave like the real API server for single objects; list and watch are
/// not supported.
#[derive(Clone, Default)]
pub struct MockApiServer {
    state: Arc<Mutex<MockState>>,
}

impl MockApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an object
    pub fn with_object<K>(self, obj: &K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        self.insert(obj);
        self
    }

    /// Answer every `method` request on `path` with an error status
    pub fn fail(self, method: &str, path: &str, code: u16, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method.to_string(), path.to_string()), (code, message.to_string()));
        self
    }

    /// Stop injecting errors
    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn insert<K>(&self, obj: &K)
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let path = object_path::<K>(obj.meta().namespace.as_deref(), &obj.meta().name.clone().unwrap_or_default());
        let mut value = serde_json::to_value(obj).unwrap();
        let mut state = self.state.lock().unwrap();
        state.assign_uid(&mut value);
        state.objects.insert(path, value);
    }

    pub fn get<K>(&self, namespace: Option<&str>, name: &str) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let path = object_path::<K>(namespace, name);
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&path)
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Number of `method` requests seen on exactly `path`
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    /// Number of requests that modified the store
    pub fn writes(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _)| m != "GET")
            .count()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Build a kube Client backed by this server
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Service<Request<Body>> for MockApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let body = req.into_body().collect().await?.to_bytes();

            let (code, body) = state.lock().unwrap().handle(&method, &path, &body);

            Ok(Response::builder()
                .status(code)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string().into_bytes()))?)
        })
    }
}

/// REST path of a single object
pub fn object_path<K: Resource<DynamicType = ()>>(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{}", K::url_path(&(), namespace), name)
}

pub fn opaque_secret(namespace: &str, name: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

pub fn credentials_secret(namespace: &str, name: &str, username: &str, password: &str) -> Secret {
    opaque_secret(namespace, name, &[("username", username), ("password", password)])
}

pub fn token_secret(namespace: &str, instance: &str, blob: &[u8]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(format!("kc-token-{}", instance)),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "token".to_string(),
            ByteString(blob.to_vec()),
        )])),
        ..Default::default()
    }
}

pub fn config_map(namespace: &str, name: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

pub fn make_keycloak(namespace: &str, name: &str, connected: bool) -> Keycloak {
    let mut kc = Keycloak::new(
        name,
        KeycloakSpec {
            url: "https://sso.example.com".to_string(),
            secret: "kc-admin".to_string(),
            ..Default::default()
        },
    );
    kc.metadata.namespace = Some(namespace.to_string());
    kc.status = Some(KeycloakStatus { connected });
    kc
}

pub fn make_cluster_keycloak(name: &str, connected: bool) -> ClusterKeycloak {
    let mut kc = ClusterKeycloak::new(
        name,
        ClusterKeycloakSpec {
            url: "https://shared-sso.example.com".to_string(),
            secret: "kc-shared-admin".to_string(),
            ..Default::default()
        },
    );
    kc.status = Some(KeycloakStatus { connected });
    kc
}

pub fn make_realm(namespace: &str, name: &str, keycloak_ref: RefSpec) -> KeycloakRealm {
    let mut realm = KeycloakRealm::new(
        name,
        KeycloakRealmSpec {
            realm_name: name.to_string(),
            keycloak_ref,
        },
    );
    realm.metadata.namespace = Some(namespace.to_string());
    realm
}

pub fn make_cluster_realm(name: &str, cluster_keycloak: &str) -> ClusterKeycloakRealm {
    ClusterKeycloakRealm::new(
        name,
        ClusterKeycloakRealmSpec {
            realm_name: name.to_string(),
            cluster_keycloak_ref: cluster_keycloak.to_string(),
        },
    )
}

pub fn make_config() -> Config {
    Config {
        operator_namespace: "keycloak-system".to_string(),
        success_reconcile_timeout: None,
        reconcile_timeout: Duration::from_secs(300),
        owner_references: true,
    }
}

/// Set a deletion timestamp, as the API server does for objects holding finalizers.
pub fn mark_deleting(meta: &mut ObjectMeta) {
    meta.deletion_timestamp = serde_json::from_value(json!("2026-01-01T00:00:00Z")).unwrap();
}

pub fn unix_in(secs: i64) -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
        + secs
}

/// An exported session whose access token expires at `exp`
pub fn session_blob(exp: i64, signature: &str) -> Vec<u8> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "sub": "admin" }).to_string());
    json!({
        "access_token": format!("{}.{}.{}", header, payload, signature),
        "refresh_token": "refresh",
        "expires_in": 300
    })
    .to_string()
    .into_bytes()
}

/// Admin client handed out by [`FakeAdminBuilder`].
#[derive(Clone, Debug)]
pub struct FakeAdminClient {
    pub url: String,
    pub token: Vec<u8>,
    pub from_cache: bool,
}

impl AdminClient for FakeAdminClient {
    fn export_token(&self) -> Result<Vec<u8>> {
        Ok(self.token.clone())
    }
}

#[derive(Default)]
struct FakeAdminState {
    logins: AtomicUsize,
    token_clients: AtomicUsize,
    reject_login: AtomicBool,
}

/// Counts logins and token reuses; every login issues a new session valid for an hour.
#[derive(Clone, Default)]
pub struct FakeAdminBuilder {
    state: Arc<FakeAdminState>,
}

impl FakeAdminBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_login() -> Self {
        let builder = Self::default();
        builder.state.reject_login.store(true, Ordering::SeqCst);
        builder
    }

    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn token_clients(&self) -> usize {
        self.state.token_clients.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminClientBuilder for FakeAdminBuilder {
    type Client = FakeAdminClient;

    async fn login(&self, auth: &AuthData, credentials: &Credentials) -> Result<FakeAdminClient> {
        if self.state.reject_login.load(Ordering::SeqCst) {
            return Err(KeycloakError::admin_client(format!(
                "invalid_grant for {}",
                credentials.username
            )));
        }
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;
        let n = self.state.logins.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(FakeAdminClient {
            url: auth.url.clone(),
            token: session_blob(unix_in(3600), &format!("login-{}", n)),
            from_cache: false,
        })
    }

    async fn from_token(&self, auth: &AuthData, token: &SessionToken) -> Result<FakeAdminClient> {
        self.state.token_clients.fetch_add(1, Ordering::SeqCst);

        Ok(FakeAdminClient {
            url: auth.url.clone(),
            token: token.raw().to_vec(),
            from_cache: true,
        })
    }
}

/// Synchronizer counting its calls; can be told to fail or to stall in `sync`.
#[derive(Default)]
pub struct RecordingSync {
    pub synced: AtomicUsize,
    pub deleted: AtomicUsize,
    pub fail_with: Option<String>,
    pub stall: Option<Duration>,
    pub realm_names: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl<K: Dependent> Synchronizer<K, FakeAdminClient> for RecordingSync {
    async fn sync(&self, _obj: &mut K, ctx: &SyncContext<'_, FakeAdminClient>) -> Result<()> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        self.synced.fetch_add(1, Ordering::SeqCst);
        self.realm_names
            .lock()
            .unwrap()
            .push(ctx.realm_name.map(str::to_string));
        match &self.fail_with {
            Some(msg) => Err(KeycloakError::admin_client(msg.clone())),
            None => Ok(()),
        }
    }

    async fn delete(&self, _obj: &K, _ctx: &SyncContext<'_, FakeAdminClient>) -> Result<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Reconciler for `K` against `server`, driven by a [`RecordingSync`].
pub fn make_reconciler<K: Dependent>(
    server: &MockApiServer,
    sync: RecordingSync,
    config: Config,
) -> DependentReconciler<K, FakeAdminBuilder, RecordingSync> {
    let client = server.clone().into_client();
    let factory = Arc::new(ClientFactory::new(client.clone(), FakeAdminBuilder::new()));
    DependentReconciler::new(Helper::new(client, config, factory), sync)
}

/// A realm-scoped dependent used to exercise the generic machinery.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "keycloak.geeko.me",
    version = "v1",
    kind = "KeycloakGroup",
    plural = "keycloakgroups"
)]
#[kube(namespaced)]
#[kube(status = "SyncStatus")]
#[serde(rename_all = "camelCase")]
pub struct KeycloakGroupSpec {
    pub name: String,
    pub realm_ref: RefSpec,
}

impl HasRealmRef for KeycloakGroup {
    fn realm_ref(&self) -> Result<RealmRef> {
        RealmRef::try_from(&self.spec.realm_ref)
    }
}

impl Dependent for KeycloakGroup {
    const FINALIZER: &'static str = "keycloak.geeko.me/group";
    type Status = SyncStatus;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
        Api::namespaced(client, namespace.unwrap_or_default())
    }

    fn parent_ref(&self) -> Result<ParentRef> {
        self.realm_ref().map(ParentRef::from)
    }

    fn status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut SyncStatus {
        self.status.get_or_insert_with(SyncStatus::default)
    }
}

pub fn make_group(namespace: &str, name: &str, realm_ref: RefSpec) -> KeycloakGroup {
    let mut group = KeycloakGroup::new(
        name,
        KeycloakGroupSpec {
            name: name.to_string(),
            realm_ref,
        },
    );
    group.metadata.namespace = Some(namespace.to_string());
    group
}
