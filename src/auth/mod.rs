// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keycloak connection data and authenticated admin clients.

pub mod data;
pub mod factory;
pub mod token;

pub use data::{AuthData, AuthDataResolver};
pub use factory::{AdminClient, AdminClientBuilder, ClientFactory};
pub use token::SessionToken;
