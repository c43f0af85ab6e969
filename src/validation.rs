use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Language};

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MIN_CHARS: usize = 20;
pub const BODY_MAX_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Category,
    Title,
    Body,
}

pub type FieldErrors = BTreeMap<Field, String>;

/// Raw "Ask a question" input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionDraft {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub language: Language,
}

/// Partial edit of a draft. Only the fields present are touched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DraftUpdate {
    pub category: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidatedQuestion {
    pub category: Category,
    pub title: String,
    pub body: String,
    pub language: Language,
}

fn check_category(raw: Option<&str>) -> Result<Category, String> {
    raw.filter(|c| !c.is_empty())
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| "Please select a category".to_string())
}

// Lengths are character counts, not bytes or words.
fn check_title(title: &str) -> Result<(), String> {
    let n = title.chars().count();
    if n < TITLE_MIN_CHARS {
        return Err(format!("Title must be at least {TITLE_MIN_CHARS} characters"));
    }
    if n > TITLE_MAX_CHARS {
        return Err(format!("Title must be less than {TITLE_MAX_CHARS} characters"));
    }
    Ok(())
}

fn check_body(body: &str) -> Result<(), String> {
    let n = body.chars().count();
    if n < BODY_MIN_CHARS {
        return Err(format!("Please provide more details (at least {BODY_MIN_CHARS} characters)"));
    }
    if n > BODY_MAX_CHARS {
        return Err(format!("Description is too long (maximum {BODY_MAX_CHARS} characters)"));
    }
    Ok(())
}

pub fn validate(draft: &QuestionDraft) -> Result<ValidatedQuestion, FieldErrors> {
    let mut errors = FieldErrors::new();
    let category = check_category(draft.category.as_deref())
        .map_err(|e| errors.insert(Field::Category, e))
        .ok();
    if let Err(e) = check_title(&draft.title) {
        errors.insert(Field::Title, e);
    }
    if let Err(e) = check_body(&draft.body) {
        errors.insert(Field::Body, e);
    }
    match category {
        Some(category) if errors.is_empty() => Ok(ValidatedQuestion {
            category,
            title: draft.title.clone(),
            body: draft.body.clone(),
            language: draft.language,
        }),
        _ => Err(errors),
    }
}

/// Whether the submit control is enabled.
pub fn can_submit(draft: &QuestionDraft) -> bool {
    validate(draft).is_ok()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("question already submitted")]
    AlreadySubmitted,
    #[error("validation failed")]
    Invalid(FieldErrors),
}

/// Post-question form state owned by one session.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PostForm {
    pub draft: QuestionDraft,
    pub errors: FieldErrors,
    pub submitted: bool,
}

impl PostForm {
    pub fn can_submit(&self) -> bool {
        !self.submitted && can_submit(&self.draft)
    }

    /// Applies an edit. Every touched field loses its pending error.
    pub fn edit(&mut self, update: DraftUpdate) -> Result<(), FormError> {
        if self.submitted {
            return Err(FormError::AlreadySubmitted);
        }
        if let Some(c) = update.category {
            self.draft.category = if c.is_empty() { None } else { Some(c) };
            self.errors.remove(&Field::Category);
        }
        if let Some(t) = update.title {
            self.draft.title = t;
            self.errors.remove(&Field::Title);
        }
        if let Some(b) = update.body {
            self.draft.body = b;
            self.errors.remove(&Field::Body);
        }
        if let Some(l) = update.language {
            self.draft.language = l;
        }
        Ok(())
    }

    /// Validates the current draft; on success the form becomes terminal.
    pub fn submit(&mut self) -> Result<ValidatedQuestion, FormError> {
        if self.submitted {
            return Err(FormError::AlreadySubmitted);
        }
        match validate(&self.draft) {
            Ok(q) => {
                self.errors.clear();
                self.submitted = true;
                Ok(q)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(FormError::Invalid(errors))
            }
        }
    }

    pub fn reset(&mut self) {
        *self = PostForm::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title_len: usize, body_len: usize) -> QuestionDraft {
        QuestionDraft {
            category: Some("Payments".into()),
            title: "t".repeat(title_len),
            body: "b".repeat(body_len),
            language: Language::English,
        }
    }

    #[test]
    fn title_bounds_are_inclusive() {
        assert!(validate(&draft(9, 20)).unwrap_err().contains_key(&Field::Title));
        assert!(validate(&draft(10, 20)).is_ok());
        assert!(validate(&draft(200, 20)).is_ok());
        assert!(validate(&draft(201, 20)).unwrap_err().contains_key(&Field::Title));
    }

    #[test]
    fn body_bounds_are_inclusive() {
        assert!(validate(&draft(10, 19)).unwrap_err().contains_key(&Field::Body));
        assert!(validate(&draft(10, 20)).is_ok());
        assert!(validate(&draft(10, 5000)).is_ok());
        assert!(validate(&draft(10, 5001)).unwrap_err().contains_key(&Field::Body));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut d = draft(0, 20);
        d.title = "é".repeat(10); // 20 bytes, 10 chars
        assert!(validate(&d).is_ok());
        d.title = "é".repeat(150); // 300 bytes
        assert!(validate(&d).is_ok());
    }

    #[test]
    fn category_must_be_one_of_six() {
        let mut d = draft(10, 20);
        d.category = None;
        assert_eq!(validate(&d).unwrap_err()[&Field::Category], "Please select a category");
        d.category = Some("Billing".into());
        assert!(validate(&d).is_err());
        d.category = Some("Delivery".into());
        assert!(can_submit(&d));
    }

    #[test]
    fn all_errors_reported_together() {
        let errs = validate(&QuestionDraft::default()).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[&Field::Title], "Title must be at least 10 characters");
        assert_eq!(errs[&Field::Body], "Please provide more details (at least 20 characters)");
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut form = PostForm::default();
        assert!(matches!(form.submit(), Err(FormError::Invalid(_))));
        assert_eq!(form.errors.len(), 3);
        form.edit(DraftUpdate { title: Some("short".into()), ..Default::default() }).unwrap();
        assert!(!form.errors.contains_key(&Field::Title));
        assert!(form.errors.contains_key(&Field::Body));
        assert!(form.errors.contains_key(&Field::Category));
        assert!(!form.submitted);
    }

    #[test]
    fn submitted_form_is_terminal() {
        let mut form = PostForm { draft: draft(12, 40), ..Default::default() };
        assert!(form.can_submit());
        let q = form.submit().unwrap();
        assert_eq!(q.category, Category::Payments);
        assert!(form.submitted);
        assert!(!form.can_submit());
        assert_eq!(form.submit(), Err(FormError::AlreadySubmitted));
        assert_eq!(form.edit(DraftUpdate::default()), Err(FormError::AlreadySubmitted));
        form.reset();
        assert!(!form.submitted);
        assert!(form.draft.title.is_empty());
    }
}
