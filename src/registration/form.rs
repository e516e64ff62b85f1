use serde::Serialize;
use tracing::debug;

use super::draft::{FieldEdit, RegistrationDraft};
use super::dto::RegisteredUser;
use super::services::RegistrationService;
use crate::error::{FormError, RegistrationError};

/// Where a registration screen is in its submit cycle.
///
/// `Idle → Submitting → Succeeded | Failed`; any settled phase may start a new
/// attempt, nothing may start one while `Submitting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn can_transition_to(&self, target: SubmissionPhase) -> bool {
        use SubmissionPhase::*;
        matches!(
            (self, target),
            (Idle | Succeeded | Failed, Submitting) | (Submitting, Succeeded | Failed)
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

/// State owned by one registration screen for its lifetime.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    draft: RegistrationDraft,
    phase: SubmissionPhase,
    last_error: Option<RegistrationError>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&RegistrationError> {
        self.last_error.as_ref()
    }

    /// Message to show under the title, if the last attempt failed.
    pub fn error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(RegistrationError::message)
    }

    /// Replaces the draft with the edited one. Refused while a submission is pending.
    pub fn edit(&mut self, edit: FieldEdit) -> Result<&RegistrationDraft, FormError> {
        if self.phase.is_pending() {
            return Err(FormError::Submitting);
        }
        self.draft = self.draft.apply(edit);
        Ok(&self.draft)
    }

    /// Enters `Submitting` and hands out the draft to submit.
    pub fn begin_submit(&mut self) -> Result<RegistrationDraft, FormError> {
        self.transition(SubmissionPhase::Submitting)?;
        Ok(self.draft.clone())
    }

    /// Settles the pending attempt. Success resets the draft; failure keeps it
    /// so the user can correct it and try again.
    pub fn finish(
        &mut self,
        result: &Result<RegisteredUser, RegistrationError>,
    ) -> Result<SubmissionPhase, FormError> {
        match result {
            Ok(_) => {
                self.transition(SubmissionPhase::Succeeded)?;
                self.draft = RegistrationDraft::new();
                self.last_error = None;
            }
            Err(e) => {
                self.transition(SubmissionPhase::Failed)?;
                self.last_error = Some(e.clone());
            }
        }
        Ok(self.phase)
    }

    /// Runs one full attempt against `service`.
    pub async fn submit(
        &mut self,
        service: &RegistrationService,
    ) -> Result<Result<RegisteredUser, RegistrationError>, FormError> {
        let draft = self.begin_submit()?;
        let result = service.submit(&draft).await;
        self.finish(&result)?;
        Ok(result)
    }

    fn transition(&mut self, target: SubmissionPhase) -> Result<(), FormError> {
        if !self.phase.can_transition_to(target) {
            return Err(if self.phase.is_pending() {
                FormError::Submitting
            } else {
                FormError::NotSubmitting
            });
        }
        debug!(from = ?self.phase, to = ?target, "registration form phase");
        self.phase = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::ErrorKind;
    use crate::registration::fakes::{FakeAuth, FakeStorage, Recorder};
    use crate::registration::services::DEFAULT_PROFILES_TABLE;

    fn filled_form() -> RegistrationForm {
        let mut form = RegistrationForm::new();
        for edit in [
            FieldEdit::Email("a@x.com".into()),
            FieldEdit::Password("secret1".into()),
            FieldEdit::Age("30".into()),
        ] {
            form.edit(edit).unwrap();
        }
        form
    }

    #[test]
    fn phase_transitions() {
        use SubmissionPhase::*;
        assert!(Idle.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Succeeded));
        assert!(Submitting.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Submitting));
        assert!(Succeeded.can_transition_to(Submitting));
        assert!(!Submitting.can_transition_to(Submitting));
        assert!(!Idle.can_transition_to(Succeeded));
        assert!(!Failed.can_transition_to(Succeeded));
    }

    #[test]
    fn second_begin_while_pending_is_refused() {
        let mut form = filled_form();
        form.begin_submit().unwrap();
        assert_eq!(form.begin_submit().unwrap_err(), FormError::Submitting);
        assert_eq!(
            form.edit(FieldEdit::Age("31".into())).unwrap_err(),
            FormError::Submitting
        );
    }

    #[test]
    fn finish_without_begin_is_refused() {
        let mut form = filled_form();
        let err = form
            .finish(&Err(RegistrationError::AuthFailure { message: "x".into(), status: None }))
            .unwrap_err();
        assert_eq!(err, FormError::NotSubmitting);
        assert_eq!(form.phase(), SubmissionPhase::Idle);
    }

    #[tokio::test]
    async fn success_resets_draft() {
        let rec = Recorder::default();
        let svc = RegistrationService::new(
            Arc::new(FakeAuth::ok(&rec, ["u1"])),
            Arc::new(FakeStorage::ok(&rec)),
            DEFAULT_PROFILES_TABLE,
        );
        let mut form = filled_form();

        let user = form.submit(&svc).await.unwrap().unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(form.phase(), SubmissionPhase::Succeeded);
        assert_eq!(form.draft(), &RegistrationDraft::new());
        assert!(form.error_message().is_none());
    }

    #[tokio::test]
    async fn failure_keeps_draft_and_message() {
        let rec = Recorder::default();
        let svc = RegistrationService::new(
            Arc::new(FakeAuth::failing(&rec, "Email already registered")),
            Arc::new(FakeStorage::ok(&rec)),
            DEFAULT_PROFILES_TABLE,
        );
        let mut form = filled_form();
        let before = form.draft().clone();

        let result = form.submit(&svc).await.unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::AuthFailure);
        assert_eq!(form.phase(), SubmissionPhase::Failed);
        assert_eq!(form.draft(), &before);
        assert_eq!(form.error_message().as_deref(), Some("Email already registered"));

        form.edit(FieldEdit::Email("b@x.com".into())).unwrap();
        assert_eq!(form.draft().email, "b@x.com");
    }
}
