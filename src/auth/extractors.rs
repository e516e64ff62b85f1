use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::RegistrationError;

/// Raw access token from an `Authorization: Bearer <token>` header.
///
/// Only the header's shape is checked here; the token itself is verified by
/// the auth collaborator.
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = RegistrationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("invalid auth scheme"))?;

        Ok(BearerToken(token.to_string()))
    }
}

fn unauthorized(message: &str) -> RegistrationError {
    RegistrationError::Unauthorized {
        message: message.to_string(),
    }
}
