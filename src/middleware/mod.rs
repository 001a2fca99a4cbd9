// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, rate limiting, errors).

pub mod auth;
pub mod errors;
pub mod rate_limit;
pub mod security;

pub use auth::{require_auth, resolve_session, AuthUser, CurrentSession};
pub use rate_limit::{rate_limit, ClientLimiter};
