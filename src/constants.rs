// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group of the Keycloak custom resources
pub const API_GROUP: &str = "keycloak.geeko.me";

/// Kubernetes annotation keys used by the operator
pub mod annotations {
    /// When set to "true", remote resources are left in place when the object is deleted
    pub const PRESERVE_RESOURCES_ON_DELETION: &str =
        "keycloak.geeko.me/preserve-resources-on-deletion";
}

/// Finalizers guarding the Keycloak side of each resource
pub mod finalizers {
    pub const REALM: &str = "keycloak.geeko.me/realm";
    pub const CLUSTER_REALM: &str = "keycloak.geeko.me/cluster-realm";
}

/// Kind strings accepted in `keycloakRef` and `realmRef`
pub mod kinds {
    pub const KEYCLOAK: &str = "Keycloak";
    pub const CLUSTER_KEYCLOAK: &str = "ClusterKeycloak";
    pub const KEYCLOAK_REALM: &str = "KeycloakRealm";
    pub const CLUSTER_KEYCLOAK_REALM: &str = "ClusterKeycloakRealm";
}

/// Cached admin session token secrets
pub mod token {
    /// Prefix of the secret name, followed by the Keycloak instance name
    pub const SECRET_PREFIX: &str = "kc-token-";
    /// Data key holding the exported session blob
    pub const SECRET_KEY: &str = "token";
}

/// Keys of the admin credentials secret
pub mod credentials {
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
}

/// Status value written after a successful reconciliation
pub const STATUS_OK: &str = "OK";

/// Requeue timings
pub mod requeue {
    /// Revisit delay when the Keycloak instance is not connected
    pub const NOT_AVAILABLE_SECS: u64 = 60;
    /// Base of the linear failure backoff
    pub const FAILURE_BASE_SECS: u64 = 10;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRDs
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
