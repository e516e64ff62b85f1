use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightGoal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    MuscleGain,
    FatLoss,
    #[default]
    Maintain,
}

/// Registration form values as typed by the user.
///
/// Numeric fields keep the raw text; they are coerced only when the draft is
/// submitted (see [`RegistrationDraft::coerced`]). A draft is never mutated in
/// place: every edit goes through [`RegistrationDraft::apply`], which returns a
/// new value.
#[derive(Clone, Default, PartialEq)]
pub struct RegistrationDraft {
    pub email: String,
    pub password: String,
    pub age: String,
    pub weight: String,
    pub height: String,
    pub gender: Gender,
    pub allergies: Vec<String>,
    pub is_vegetarian: bool,
    pub health_conditions: Vec<String>,
    pub activity_level: ActivityLevel,
    pub weight_goal: WeightGoal,
    pub fitness_goal: FitnessGoal,
}

impl std::fmt::Debug for RegistrationDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationDraft")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("age", &self.age)
            .field("weight", &self.weight)
            .field("height", &self.height)
            .field("gender", &self.gender)
            .field("allergies", &self.allergies)
            .field("is_vegetarian", &self.is_vegetarian)
            .field("health_conditions", &self.health_conditions)
            .field("activity_level", &self.activity_level)
            .field("weight_goal", &self.weight_goal)
            .field("fitness_goal", &self.fitness_goal)
            .finish()
    }
}

/// Which tag list an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagList {
    Allergies,
    HealthConditions,
}

/// One user edit of the registration form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Email(String),
    Password(String),
    Age(String),
    Weight(String),
    Height(String),
    Gender(Gender),
    ActivityLevel(ActivityLevel),
    WeightGoal(WeightGoal),
    FitnessGoal(FitnessGoal),
    Vegetarian(bool),
    ToggleVegetarian,
    /// Replace a tag list wholesale.
    SetTags(TagList, Vec<String>),
    /// Replace a tag list from free text ("peanuts, shellfish; gluten").
    ParseTags(TagList, String),
    AddTag(TagList, String),
    RemoveTag(TagList, String),
}

/// Draft numbers after lenient coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoercedMetrics {
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
}

impl RegistrationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the draft that results from applying `edit`; `self` is left untouched.
    pub fn apply(&self, edit: FieldEdit) -> Self {
        let mut next = self.clone();
        match edit {
            FieldEdit::Email(v) => next.email = v,
            FieldEdit::Password(v) => next.password = v,
            FieldEdit::Age(v) => next.age = v,
            FieldEdit::Weight(v) => next.weight = v,
            FieldEdit::Height(v) => next.height = v,
            FieldEdit::Gender(v) => next.gender = v,
            FieldEdit::ActivityLevel(v) => next.activity_level = v,
            FieldEdit::WeightGoal(v) => next.weight_goal = v,
            FieldEdit::FitnessGoal(v) => next.fitness_goal = v,
            FieldEdit::Vegetarian(v) => next.is_vegetarian = v,
            FieldEdit::ToggleVegetarian => next.is_vegetarian = !next.is_vegetarian,
            FieldEdit::SetTags(list, tags) => *next.tags_mut(list) = tags,
            FieldEdit::ParseTags(list, text) => *next.tags_mut(list) = parse_tags(&text),
            FieldEdit::AddTag(list, tag) => {
                let tag = tag.trim().to_string();
                let tags = next.tags_mut(list);
                if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                    tags.push(tag);
                }
            }
            FieldEdit::RemoveTag(list, tag) => {
                let tag = tag.trim();
                next.tags_mut(list).retain(|t| !t.eq_ignore_ascii_case(tag));
            }
        }
        next
    }

    /// Applies a sequence of edits in order.
    pub fn apply_all<I>(&self, edits: I) -> Self
    where
        I: IntoIterator<Item = FieldEdit>,
    {
        edits
            .into_iter()
            .fold(self.clone(), |draft, edit| draft.apply(edit))
    }

    pub fn coerced(&self) -> CoercedMetrics {
        CoercedMetrics {
            age: coerce_age(&self.age),
            weight_kg: coerce_measure(&self.weight),
            height_cm: coerce_measure(&self.height),
        }
    }

    fn tags_mut(&mut self, list: TagList) -> &mut Vec<String> {
        match list {
            TagList::Allergies => &mut self.allergies,
            TagList::HealthConditions => &mut self.health_conditions,
        }
    }
}

lazy_static! {
    static ref INT_PREFIX: Regex = Regex::new(r"^\s*([+-]?\d+)").unwrap();
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap();
    static ref TAG_SEPARATOR: Regex = Regex::new(r"[,;\n]").unwrap();
}

/// Leading integer of `raw`, or 0 when there is none, it is negative, or it overflows.
pub fn coerce_age(raw: &str) -> u32 {
    INT_PREFIX
        .captures(raw)
        .and_then(|c| c[1].parse::<i64>().ok())
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Leading decimal number of `raw`, or 0.0 when there is none or it is negative or non-finite.
pub fn coerce_measure(raw: &str) -> f64 {
    FLOAT_PREFIX
        .captures(raw)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 0.0)
        .unwrap_or(0.0)
}

/// Splits free text into trimmed tags, dropping empties and case-insensitive duplicates.
pub fn parse_tags(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in TAG_SEPARATOR.split(text).map(str::trim) {
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}
