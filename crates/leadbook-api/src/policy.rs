//! Route → capability policy and the guard that enforces it.
//!
//! The guard runs as a route layer, after routing, so it sees the matched
//! route template (`/api/leads/{id}`) rather than the raw path. Routes not
//! listed in [`POLICY`] require authentication.

use std::sync::Arc;

use axum::{
  extract::{MatchedPath, Request, State},
  http::Method,
  middleware::Next,
  response::Response,
};

use crate::{
  auth::{TokenService, bearer_token},
  error::ApiError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  /// No credentials needed.
  Public,
  /// A valid bearer token is required.
  Authenticated,
}

/// `(method, route template, capability)` for every API route.
pub const POLICY: &[(&str, &str, Capability)] = &[
  ("POST", "/api/auth/register", Capability::Public),
  ("POST", "/api/auth/login", Capability::Public),
  ("GET", "/api/leads", Capability::Authenticated),
  ("POST", "/api/leads", Capability::Authenticated),
  ("POST", "/api/leads/bulk", Capability::Authenticated),
  ("GET", "/api/leads/{id}", Capability::Authenticated),
  ("PUT", "/api/leads/{id}", Capability::Authenticated),
  ("DELETE", "/api/leads/{id}", Capability::Authenticated),
];

/// Capability required for `method` on `route`.
pub fn required(method: &Method, route: &str) -> Capability {
  POLICY
    .iter()
    .find(|(m, r, _)| *m == method.as_str() && *r == route)
    .map_or(Capability::Authenticated, |(_, _, c)| *c)
}

/// Middleware: reject requests lacking the capability their route needs.
/// Verified [`crate::auth::Claims`] are attached to the request.
pub async fn guard(
  State(tokens): State<Arc<TokenService>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let capability = req
    .extensions()
    .get::<MatchedPath>()
    .map_or(Capability::Authenticated, |route| required(req.method(), route.as_str()));

  if capability == Capability::Authenticated {
    let token = bearer_token(req.headers())
      .ok_or_else(|| ApiError::Unauthorized("Access denied".into()))?;
    let claims = tokens.verify(token)?;
    req.extensions_mut().insert(claims);
  }

  Ok(next.run(req).await)
}
