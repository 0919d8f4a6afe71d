// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use thiserror::Error;

/// Reference families that are dispatched on their `kind` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFamily {
    Keycloak,
    Realm,
}

impl fmt::Display for RefFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefFamily::Keycloak => f.write_str("keycloak"),
            RefFamily::Realm => f.write_str("realm"),
        }
    }
}

/// The distinguished error kinds callers are allowed to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The Keycloak instance reports itself as not connected.
    NotAvailable,
    /// The referenced parent is gone while the dependent is being deleted.
    ParentNotFound,
    /// A reference carries a kind this operator does not know.
    UnknownKind,
    Other,
}

#[derive(Error, Debug)]
pub enum KeycloakError {
    #[error("keycloak is not available")]
    NotAvailable,

    #[error("parent {kind} '{name}' not found")]
    ParentNotFound { kind: String, name: String },

    #[error("unknown {family} kind: {kind}")]
    UnknownKind { family: RefFamily, kind: String },

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid session token: {0}")]
    TokenError(String),

    #[error("Invalid secret: {0}")]
    SecretError(String),

    #[error("Admin client error: {0}")]
    AdminClientError(String),

    #[error("Owner reference error: {0}")]
    OwnerRefError(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Reconciliation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<KeycloakError>,
    },
}

impl KeycloakError {
    pub fn unknown_kind(family: RefFamily, kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            family,
            kind: kind.into(),
        }
    }

    pub fn admin_client(msg: impl Into<String>) -> Self {
        Self::AdminClientError(msg.into())
    }

    /// Kind of the innermost error, looking through any context layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeycloakError::NotAvailable => ErrorKind::NotAvailable,
            KeycloakError::ParentNotFound { .. } => ErrorKind::ParentNotFound,
            KeycloakError::UnknownKind { .. } => ErrorKind::UnknownKind,
            KeycloakError::Context { source, .. } => source.kind(),
            _ => ErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            KeycloakError::KubeError(kube::Error::Api(err)) => err.code == 404,
            KeycloakError::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeycloakError>;

/// Attaches call-site context to errors as they propagate.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<KeycloakError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| KeycloakError::Context {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| KeycloakError::Context {
            context: f().into(),
            source: Box::new(e.into()),
        })
    }
}
