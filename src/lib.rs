// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod auth;
pub mod backoff;
pub mod config;
pub mod constants;
pub mod deletion;
pub mod error;
pub mod helper;
pub mod kubernetes;
pub mod ownership;
pub mod reconcilers;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use error::{ErrorKind, KeycloakError, Result};
pub use helper::Helper;
