// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod oauth;
pub mod oauth_state;
pub mod session;
pub mod sweeper;
pub mod upstream;
pub mod users;

pub use oauth::OAuthService;
pub use session::SessionManager;
pub use sweeper::spawn_sweeper;
pub use upstream::UpstreamClient;
pub use users::find_or_create_user;
