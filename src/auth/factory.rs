// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Authenticated admin clients, built from the cached session when possible.
//!
//! One lock guards the whole acquisition so that a burst of reconciliations against the
//! same instance performs a single login; the others pick up the freshly cached session.
//! The lock is shared by all instances, which also serializes unrelated logins.

use async_trait::async_trait;
use kube::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::auth::data::AuthData;
use crate::auth::token::SessionToken;
use crate::error::{Result, ResultExt};
use crate::kubernetes::secrets::{get_credentials, Credentials, TokenStore};

/// A live, authenticated client of the Keycloak admin API.
pub trait AdminClient: Send + Sync + 'static {
    /// Serialize the current session so it can be restored with
    /// [`AdminClientBuilder::from_token`].
    fn export_token(&self) -> Result<Vec<u8>>;
}

/// Creates admin clients, either by logging in or from an exported session.
#[async_trait]
pub trait AdminClientBuilder: Send + Sync + 'static {
    type Client: AdminClient;

    async fn login(&self, auth: &AuthData, credentials: &Credentials) -> Result<Self::Client>;

    async fn from_token(&self, auth: &AuthData, token: &SessionToken) -> Result<Self::Client>;
}

pub struct ClientFactory<B> {
    client: Client,
    tokens: TokenStore,
    builder: B,
    lock: Mutex<()>,
}

impl<B: AdminClientBuilder> ClientFactory<B> {
    pub fn new(client: Client, builder: B) -> Self {
        Self {
            tokens: TokenStore::new(client.clone()),
            client,
            builder,
            lock: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Get a client for the instance described by `auth`.
    ///
    /// A cached session that is missing or expired falls back to a login, whose session
    /// then replaces the cached one. Any other problem with the cache is an error.
    #[instrument(skip(self, auth), fields(instance = %auth.instance_name, namespace = %auth.secret_namespace))]
    pub async fn client(&self, auth: &AuthData) -> Result<B::Client> {
        let _guard = self.lock.lock().await;

        if let Some(client) = self
            .from_cached_token(auth)
            .await
            .context("unable to create kc client from token secret")?
        {
            return Ok(client);
        }

        self.from_login(auth)
            .await
            .context("unable to create kc client from login password")
    }

    async fn from_cached_token(&self, auth: &AuthData) -> Result<Option<B::Client>> {
        let Some(blob) = self
            .tokens
            .get(&auth.instance_name, &auth.secret_namespace)
            .await?
        else {
            return Ok(None);
        };

        let token = SessionToken::parse(&blob)?;
        if token.is_expired() {
            debug!(
                "Cached session of {} expired at {}",
                auth.instance_name,
                token.expires_at()
            );
            return Ok(None);
        }

        self.builder
            .from_token(auth, &token)
            .await
            .context("unable to make client from token")
            .map(Some)
    }

    async fn from_login(&self, auth: &AuthData) -> Result<B::Client> {
        let credentials = get_credentials(&self.client, &auth.secret_name, &auth.secret_namespace)
            .await
            .context("unable to get credentials")?;

        let client = self
            .builder
            .login(auth, &credentials)
            .await
            .context("unable to init admin client")?;

        let blob = client
            .export_token()
            .context("unable to export client token")?;
        self.tokens
            .save(&auth.instance_name, &auth.secret_namespace, &blob)
            .await
            .context("unable to save token to secret")?;

        info!(
            "Logged in to {} as {}",
            auth.instance_name, credentials.username
        );
        Ok(client)
    }
}
