// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credential;
pub mod federated;
pub mod google;
pub mod hasher;
pub mod token;

pub use credential::CredentialAuthenticator;
pub use federated::{
    FederatedIdentityResolver, FederatedUser, ProviderGateway, SigninAction, SigninIntent,
};
pub use google::GoogleGateway;
pub use hasher::{Argon2Hasher, CredentialHasher, HasherError};
pub use token::{TokenPair, TokenService};
