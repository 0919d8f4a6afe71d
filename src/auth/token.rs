// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Exported admin session tokens.
//!
//! The blob is whatever the admin client exported; only the `exp` claim of its access
//! token is inspected, to decide whether the cache is still worth trying.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{KeycloakError, Result, ResultExt};

#[derive(Deserialize)]
struct ExportedSession {
    access_token: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// A cached admin session, kept verbatim next to its decoded expiry.
#[derive(Clone)]
pub struct SessionToken {
    raw: Vec<u8>,
    expires_at: i64,
}

impl SessionToken {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let session: ExportedSession =
            serde_json::from_slice(raw).context("unable to decode session json")?;

        let parts: Vec<&str> = session.access_token.split('.').collect();
        if parts.len() < 3 {
            return Err(KeycloakError::TokenError(
                "wrong JWT token structure".to_string(),
            ));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| KeycloakError::TokenError(format!("wrong JWT base64 encoding: {}", e)))?;
        let claims: Claims =
            serde_json::from_slice(&payload).context("unable to decode JWT payload json")?;

        Ok(Self {
            raw: raw.to_vec(),
            expires_at: claims.exp,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Expiry as seconds since the Unix epoch
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
