use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{ErrorResponse, OrphanView, ProfileRecord, RegisterRequest, RegisteredUser};
use crate::auth::extractors::BearerToken;
use crate::error::RegistrationError;
use crate::state::AppState;

pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register/:user_id/profile", post(retry_profile))
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistrationError::AuthFailure { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            RegistrationError::ProfileWriteFailure { .. } => StatusCode::BAD_GATEWAY,
            RegistrationError::AlreadySubmitting { .. } => StatusCode::CONFLICT,
            RegistrationError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RegistrationError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RegistrationError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body = ErrorResponse {
            kind: self.kind(),
            message: self.message(),
            orphan: self.orphan().map(|o| OrphanView {
                user_id: o.identity.id.clone(),
                profile: o.profile.clone(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), RegistrationError> {
    let draft = payload.into_draft();
    let user = state.registration.submit(&draft).await?;
    info!(user_id = %user.user_id, "registration completed");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Re-attempts the profile write for an identity a failed registration left orphaned.
///
/// Only the holder of an access token issued to `user_id` may do this.
#[instrument(skip(state, token, profile))]
pub async fn retry_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    BearerToken(token): BearerToken,
    Json(profile): Json<ProfileRecord>,
) -> Result<StatusCode, RegistrationError> {
    if profile.id != user_id {
        return Err(RegistrationError::InvalidRequest {
            message: "profile id does not match path".to_string(),
        });
    }

    state.registration.retry_profile_as(&token, profile).await?;
    Ok(StatusCode::NO_CONTENT)
}
