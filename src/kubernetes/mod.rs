// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, secrets and value sources.

pub mod crd;
pub mod secrets;
pub mod source;

pub use crd::wait_for_crds;
pub use secrets::{get_credentials, Credentials, TokenStore};
pub use source::resolve_value;
