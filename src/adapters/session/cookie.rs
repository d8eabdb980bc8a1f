//! Session cookie middleware.
//!
//! Reads the session id from the request's `Cookie` header, or mints a
//! new one, and stores it in the request extensions for handlers to
//! extract as `Extension<SessionId>`. New sessions get a `Set-Cookie`
//! on the way out.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::ports::SessionId;

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: Arc<str>,
}

impl SessionCookie {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session id carried by the request, if any parses.
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == &*self.name)
            .and_then(|(_, value)| value.trim().parse().ok())
    }

    /// `Set-Cookie` value for a new session.
    pub fn set_cookie_value(&self, session: SessionId) -> String {
        format!("{}={session}; Path=/; HttpOnly; SameSite=Lax", self.name)
    }
}

/// Middleware assigning every request a [`SessionId`].
pub async fn session_cookie_layer(
    State(cookie): State<SessionCookie>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = cookie.read(request.headers());
    let session = existing.unwrap_or_else(SessionId::generate);
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    if existing.is_none() {
        debug!(session = %session, "New admin session");
        if let Ok(value) = HeaderValue::from_str(&cookie.set_cookie_value(session)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}
