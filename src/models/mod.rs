// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the identity subsystem.

pub mod claims;
pub mod identity;
pub mod profile;

pub use claims::SessionClaims;
pub use identity::{AccountType, Identity, Provider};
pub use profile::Profile;
