// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types and the references between them.

pub mod keycloak;
pub mod realm;
pub mod refs;
pub mod source;
pub mod status;

pub use keycloak::{AdminType, ClusterKeycloak, Keycloak};
pub use realm::{ClusterKeycloakRealm, KeycloakRealm};
pub use refs::{HasKeycloakRef, HasRealmRef, InstanceRef, ParentRef, RealmRef, RefSpec};
pub use source::{KeyRef, ValueSource};
pub use status::{ReconcileStatus, SyncStatus};
