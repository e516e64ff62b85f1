//! Shared plumbing for talking to a Supabase project over HTTP.

use std::sync::Arc;

use reqwest::{header::HeaderMap, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::config::SupabaseConfig;
use crate::error::CollaboratorError;

/// HTTP handle to one Supabase project, shared by the auth and storage clients.
#[derive(Clone)]
pub struct SupabaseHttp {
    client: reqwest::Client,
    base_url: String,
    anon_key: Arc<SecretString>,
}

impl SupabaseHttp {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: Arc::new(SecretString::from(config.anon_key.expose_secret().to_owned())),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST to `path` with the project key; `bearer` overrides the Authorization token.
    pub fn post(&self, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.request(Method::POST, path, bearer)
    }

    pub fn get(&self, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.request(Method::GET, path, bearer)
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        self.client
            .request(method, self.url(path))
            .header("apikey", key)
            .bearer_auth(bearer.unwrap_or(key))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    code: Option<serde_json::Value>,
}

/// Turns a non-success response into a [`CollaboratorError`], passing the body's message through.
pub async fn error_from_response(resp: Response) -> CollaboratorError {
    let status = resp.status();
    let headers: HeaderMap = resp.headers().clone();
    let text = resp.text().await.unwrap_or_default();
    debug!(%status, body = %text, "supabase error response");
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let message = body
        .msg
        .or(body.message)
        .or(body.error_description)
        .or(body.error.clone())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        });

    let code = body
        .error_code
        .or_else(|| match body.code {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
        .or(body.error)
        .or_else(|| {
            headers
                .get("x-sb-error-code")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

    let mut err = CollaboratorError::new(message).with_status(status.as_u16());
    if let Some(code) = code {
        err = err.with_code(code);
    }
    err
}
