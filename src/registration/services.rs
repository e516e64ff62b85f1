use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, instrument, warn};

use super::draft::RegistrationDraft;
use super::dto::{OrphanedIdentity, ProfileRecord, RegisteredUser};
use crate::auth::{AuthClient, AuthIdentity};
use crate::error::RegistrationError;
use crate::storage::StorageClient;

pub const DEFAULT_PROFILES_TABLE: &str = "user_profiles";

/// What a running operation is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    /// A sign-up, by trimmed lower-cased email.
    Email(String),
    /// A profile retry, by identity id.
    Identity(String),
}

/// Two-step registration: create the auth identity, then its profile row.
pub struct RegistrationService {
    auth: Arc<dyn AuthClient>,
    storage: Arc<dyn StorageClient>,
    profiles_table: String,
    in_flight: Mutex<HashSet<Slot>>,
}

/// Holds an in-flight slot; frees it on drop.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Slot>>,
    slot: Slot,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slot);
    }
}

impl RegistrationService {
    pub fn new(
        auth: Arc<dyn AuthClient>,
        storage: Arc<dyn StorageClient>,
        profiles_table: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            storage,
            profiles_table: profiles_table.into(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether a submission for `email` is currently running.
    pub fn is_submitting(&self, email: &str) -> bool {
        self.is_running(&Slot::Email(normalize_email(email)))
    }

    /// Whether a profile retry for `user_id` is currently running.
    pub fn is_retrying(&self, user_id: &str) -> bool {
        self.is_running(&Slot::Identity(user_id.to_string()))
    }

    fn is_running(&self, slot: &Slot) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(slot)
    }

    fn claim(&self, slot: Slot, subject: &str) -> Result<InFlight<'_>, RegistrationError> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(slot.clone()) {
            return Err(RegistrationError::AlreadySubmitting {
                subject: subject.to_string(),
            });
        }
        Ok(InFlight {
            set: &self.in_flight,
            slot,
        })
    }

    /// Runs one submission attempt for `draft`.
    ///
    /// The profile row is only written after sign-up succeeded, and always under
    /// the id that sign-up returned. If the row write fails the identity is left
    /// in place and returned inside [`RegistrationError::ProfileWriteFailure`].
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn submit(&self, draft: &RegistrationDraft) -> Result<RegisteredUser, RegistrationError> {
        let _slot = self.claim(Slot::Email(normalize_email(&draft.email)), &draft.email)?;

        let identity = self
            .auth
            .sign_up(&draft.email, &draft.password)
            .await
            .map_err(|e| {
                warn!(error = %e, status = ?e.status, "sign-up failed");
                RegistrationError::AuthFailure {
                    message: e.message,
                    status: e.status,
                }
            })?;

        let profile = ProfileRecord::from_draft(&identity.id, draft);
        self.write_profile(&identity, &profile).await.map_err(|message| {
            warn!(user_id = %identity.id, %message, "profile write failed; identity left without profile");
            RegistrationError::ProfileWriteFailure {
                message,
                orphan: Box::new(OrphanedIdentity {
                    identity: identity.clone(),
                    profile: profile.clone(),
                }),
            }
        })?;

        info!(user_id = %identity.id, "user registered");
        Ok(RegisteredUser {
            email_confirmation_required: identity.session.is_none(),
            email: identity.email.clone().unwrap_or_else(|| draft.email.clone()),
            user_id: identity.id,
        })
    }

    /// Retries only the profile write for an identity a previous attempt left orphaned.
    #[instrument(skip(self, orphan), fields(user_id = %orphan.identity.id))]
    pub async fn retry_profile(&self, orphan: &OrphanedIdentity) -> Result<(), RegistrationError> {
        let _slot = self.claim(Slot::Identity(orphan.identity.id.clone()), &orphan.identity.id)?;

        // A record built for another id must never land under this identity.
        let mut profile = orphan.profile.clone();
        profile.id = orphan.identity.id.clone();

        self.write_profile(&orphan.identity, &profile)
            .await
            .map_err(|message| {
                warn!(%message, "profile retry failed");
                RegistrationError::ProfileWriteFailure {
                    message,
                    orphan: Box::new(OrphanedIdentity {
                        identity: orphan.identity.clone(),
                        profile: profile.clone(),
                    }),
                }
            })?;

        info!("orphaned identity repaired");
        Ok(())
    }

    /// Retries the profile write on behalf of whoever holds `access_token`.
    ///
    /// The token is resolved through the auth collaborator first; the write only
    /// happens when it belongs to the identity `profile.id` names.
    #[instrument(skip(self, access_token, profile), fields(user_id = %profile.id))]
    pub async fn retry_profile_as(
        &self,
        access_token: &str,
        profile: ProfileRecord,
    ) -> Result<(), RegistrationError> {
        let identity = self.auth.user(access_token).await.map_err(|e| {
            warn!(error = %e, status = ?e.status, "access token not accepted");
            match e.status {
                Some(status) if (400..500).contains(&status) => {
                    RegistrationError::Unauthorized { message: e.message }
                }
                status => RegistrationError::AuthFailure {
                    message: e.message,
                    status,
                },
            }
        })?;

        if identity.id != profile.id {
            warn!(token_user = %identity.id, "access token belongs to another identity");
            return Err(RegistrationError::Forbidden {
                message: format!("access token does not belong to user {}", profile.id),
            });
        }

        self.retry_profile(&OrphanedIdentity { identity, profile }).await
    }

    async fn write_profile(&self, identity: &AuthIdentity, profile: &ProfileRecord) -> Result<(), String> {
        let rows = serde_json::to_value([profile]).map_err(|e| e.to_string())?;
        self.storage
            .insert(&self.profiles_table, rows, identity.access_token())
            .await
            .map_err(|e| e.message)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
