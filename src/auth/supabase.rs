use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use super::{AuthClient, AuthIdentity, AuthSession};
use crate::error::CollaboratorError;
use crate::supabase::{error_from_response, SupabaseHttp};

const SIGNUP_PATH: &str = "auth/v1/signup";
const USER_PATH: &str = "auth/v1/user";

/// Message reported when the provider hides an existing account behind an obfuscated user.
pub const ALREADY_REGISTERED: &str = "User already registered";

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    email: Option<String>,
    /// Present on real users; an empty list marks the obfuscated reply for a taken email.
    identities: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserBody,
}

/// `signup` answers with a session when auto-confirm is on and with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionBody),
    User(UserBody),
}

/// GoTrue-backed [`AuthClient`].
#[derive(Clone)]
pub struct SupabaseAuth {
    http: SupabaseHttp,
}

impl SupabaseAuth {
    pub fn new(http: SupabaseHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthClient for SupabaseAuth {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, CollaboratorError> {
        let resp = self
            .http
            .post(SIGNUP_PATH, None)
            .json(&SignUpRequest { email, password })
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(status = ?err.status, code = ?err.code, message = %err.message, "sign-up rejected");
            return Err(err);
        }

        let body: SignUpResponse = resp.json().await?;
        let identity = identity_from(body)?;
        debug!(user_id = %identity.id, has_session = identity.session.is_some(), "sign-up accepted");
        Ok(identity)
    }

    #[instrument(skip(self, access_token))]
    async fn user(&self, access_token: &str) -> Result<AuthIdentity, CollaboratorError> {
        let resp = self.http.get(USER_PATH, Some(access_token)).send().await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(status = ?err.status, code = ?err.code, message = %err.message, "access token rejected");
            return Err(err);
        }

        let user: UserBody = resp.json().await?;
        debug!(user_id = %user.id, "access token resolved");
        Ok(AuthIdentity {
            id: user.id,
            email: user.email,
            session: Some(AuthSession {
                access_token: access_token.to_string(),
                refresh_token: None,
                expires_at: None,
            }),
        })
    }
}

fn identity_from(body: SignUpResponse) -> Result<AuthIdentity, CollaboratorError> {
    let (user, session) = match body {
        SignUpResponse::Session(s) => {
            let expires_at = s
                .expires_at
                .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
                .or_else(|| {
                    s.expires_in
                        .map(|secs| OffsetDateTime::now_utc() + time::Duration::seconds(secs))
                });
            let session = AuthSession {
                access_token: s.access_token,
                refresh_token: s.refresh_token,
                expires_at,
            };
            (s.user, Some(session))
        }
        SignUpResponse::User(u) => (u, None),
    };

    if matches!(user.identities.as_deref(), Some([])) {
        return Err(CollaboratorError::new(ALREADY_REGISTERED).with_code("user_already_exists"));
    }

    Ok(AuthIdentity {
        id: user.id,
        email: user.email,
        session,
    })
}
