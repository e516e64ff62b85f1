use async_trait::async_trait;
use reqwest::header::HeaderValue;
use tracing::{debug, instrument, warn};

use crate::error::CollaboratorError;
use crate::supabase::{error_from_response, SupabaseHttp};

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Inserts `rows` (a JSON array) into `table`. `access_token` authorizes the
    /// write as that user; without it the project key is used.
    async fn insert(
        &self,
        table: &str,
        rows: serde_json::Value,
        access_token: Option<&str>,
    ) -> Result<(), CollaboratorError>;
}

/// PostgREST-backed [`StorageClient`].
#[derive(Clone)]
pub struct SupabaseStorage {
    http: SupabaseHttp,
}

impl SupabaseStorage {
    pub fn new(http: SupabaseHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StorageClient for SupabaseStorage {
    #[instrument(skip(self, rows, access_token))]
    async fn insert(
        &self,
        table: &str,
        rows: serde_json::Value,
        access_token: Option<&str>,
    ) -> Result<(), CollaboratorError> {
        let resp = self
            .http
            .post(&format!("rest/v1/{}", table), access_token)
            .header("Prefer", HeaderValue::from_static("return=minimal"))
            .json(&rows)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(status = ?err.status, code = ?err.code, message = %err.message, "insert rejected");
            return Err(err);
        }

        debug!("rows inserted");
        Ok(())
    }
}
