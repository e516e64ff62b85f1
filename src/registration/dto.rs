use serde::{Deserialize, Serialize};

use super::draft::{
    ActivityLevel, FieldEdit, FitnessGoal, Gender, RegistrationDraft, TagList, WeightGoal,
};
use crate::auth::AuthIdentity;
use crate::error::ErrorKind;

/// Row written to the profiles table, in the table's snake_case column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileRecord {
    pub id: String,
    pub age: u32,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub allergies: Vec<String>,
    pub is_vegetarian: bool,
    pub health_conditions: Vec<String>,
    pub activity_level: ActivityLevel,
    pub weight_goal: WeightGoal,
    pub fitness_goal: FitnessGoal,
}

impl ProfileRecord {
    /// Builds the row for `user_id` from a draft, coercing its numeric text.
    pub fn from_draft(user_id: &str, draft: &RegistrationDraft) -> Self {
        let metrics = draft.coerced();
        Self {
            id: user_id.to_string(),
            age: metrics.age,
            gender: draft.gender,
            weight_kg: metrics.weight_kg,
            height_cm: metrics.height_cm,
            allergies: draft.allergies.clone(),
            is_vegetarian: draft.is_vegetarian,
            health_conditions: draft.health_conditions.clone(),
            activity_level: draft.activity_level,
            weight_goal: draft.weight_goal,
            fitness_goal: draft.fitness_goal,
        }
    }
}

/// An identity whose profile row failed to be written, with everything needed to retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanedIdentity {
    pub identity: AuthIdentity,
    pub profile: ProfileRecord,
}

/// Result of a completed registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredUser {
    pub user_id: String,
    pub email: String,
    /// True when the provider issued no session, i.e. the email still has to be confirmed.
    pub email_confirmation_required: bool,
}

/// A number typed into the form; front ends may send it as text or as JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(serde_json::Number),
    Text(String),
}

impl RawNumber {
    pub fn into_text(self) -> String {
        match self {
            RawNumber::Number(n) => n.to_string(),
            RawNumber::Text(s) => s,
        }
    }
}

/// Tags as a list or as one free-text string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<String>),
    Text(String),
}

/// Request body for `POST /register`. Omitted fields keep the draft defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub age: Option<RawNumber>,
    #[serde(alias = "weightKg")]
    pub weight: Option<RawNumber>,
    #[serde(alias = "heightCm")]
    pub height: Option<RawNumber>,
    pub gender: Option<Gender>,
    pub allergies: Option<RawTags>,
    pub is_vegetarian: Option<bool>,
    pub health_conditions: Option<RawTags>,
    pub activity_level: Option<ActivityLevel>,
    pub weight_goal: Option<WeightGoal>,
    pub fitness_goal: Option<FitnessGoal>,
}

impl RegisterRequest {
    /// Replays the request as form edits on a fresh draft.
    pub fn into_draft(self) -> RegistrationDraft {
        let mut edits = vec![FieldEdit::Email(self.email), FieldEdit::Password(self.password)];
        if let Some(v) = self.age {
            edits.push(FieldEdit::Age(v.into_text()));
        }
        if let Some(v) = self.weight {
            edits.push(FieldEdit::Weight(v.into_text()));
        }
        if let Some(v) = self.height {
            edits.push(FieldEdit::Height(v.into_text()));
        }
        if let Some(v) = self.gender {
            edits.push(FieldEdit::Gender(v));
        }
        if let Some(v) = self.is_vegetarian {
            edits.push(FieldEdit::Vegetarian(v));
        }
        if let Some(v) = self.activity_level {
            edits.push(FieldEdit::ActivityLevel(v));
        }
        if let Some(v) = self.weight_goal {
            edits.push(FieldEdit::WeightGoal(v));
        }
        if let Some(v) = self.fitness_goal {
            edits.push(FieldEdit::FitnessGoal(v));
        }
        for (list, tags) in [
            (TagList::Allergies, self.allergies),
            (TagList::HealthConditions, self.health_conditions),
        ] {
            match tags {
                Some(RawTags::List(tags)) => edits.push(FieldEdit::SetTags(list, tags)),
                Some(RawTags::Text(text)) => edits.push(FieldEdit::ParseTags(list, text)),
                None => {}
            }
        }
        RegistrationDraft::new().apply_all(edits)
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphan: Option<OrphanView>,
}

/// What a client needs to retry an orphaned profile write. Session tokens stay out of it.
#[derive(Debug, Serialize)]
pub struct OrphanView {
    pub user_id: String,
    pub profile: ProfileRecord,
}
