// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Worklane identity: account and session management for the Worklane
//! job-search platform.
//!
//! This crate establishes who a caller is (password-based or federated
//! OAuth), issues and validates signed session tokens, and safely links
//! or creates accounts when a federated identity provider is involved.
//! HTTP routing and the persistence engine live elsewhere; persistence is
//! consumed through the [`store`] trait contracts.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AuthError, Result};
