use std::sync::Arc;

use crate::auth::{supabase::SupabaseAuth, AuthClient};
use crate::config::AppConfig;
use crate::registration::services::RegistrationService;
use crate::storage::{StorageClient, SupabaseStorage};
use crate::supabase::SupabaseHttp;

#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = SupabaseHttp::new(&config.supabase)?;
        let auth = Arc::new(SupabaseAuth::new(http.clone())) as Arc<dyn AuthClient>;
        let storage = Arc::new(SupabaseStorage::new(http)) as Arc<dyn StorageClient>;
        tracing::info!(
            supabase_url = %config.supabase.url,
            profiles_table = %config.profiles_table,
            "registration backend configured"
        );
        Ok(Self::from_parts(Arc::new(RegistrationService::new(
            auth,
            storage,
            config.profiles_table.clone(),
        ))))
    }

    pub fn from_parts(registration: Arc<RegistrationService>) -> Self {
        Self { registration }
    }
}
