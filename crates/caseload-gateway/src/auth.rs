// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication against the `users` table.
//!
//! Fail-closed: any path that cannot positively resolve a user — missing
//! header, unknown token, storage error — rejects with 401. The webhook
//! route does not use this middleware; its signature is its credential.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use caseload_core::types::User;
use caseload_storage::queries::users;

use crate::server::GatewayState;

/// The authenticated principal, injected into request extensions.
#[derive(Clone)]
pub struct AuthUser(pub User);

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the api_token.
        f.debug_struct("AuthUser").field("id", &self.0.id).finish()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token to a user, if the header carries a valid one.
///
/// Used directly by routes where auth is optional. Storage errors read as
/// "no user" here; the optional paths degrade instead of failing.
pub async fn resolve_user(state: &GatewayState, headers: &HeaderMap) -> Option<User> {
    let token = bearer_token(headers)?;
    match users::get_by_api_token(&state.db, token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "token lookup failed, treating as anonymous");
            None
        }
    }
}

/// Middleware for routes that require an authenticated user.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match users::get_by_api_token(&state.db, token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser(user));
            Ok(next.run(request).await)
        }
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            // Token store unreachable: fail closed.
            tracing::error!(error = %e, "token store unavailable, rejecting request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
