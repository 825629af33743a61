//! Field validation rules for back-office forms.
//!
//! Rules are evaluated against the raw `field -> value` map submitted by a
//! form, before any database access. Lengths count Unicode scalar values, so
//! `"あ"` is one character even though it is three bytes of UTF-8.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Raw form input keyed by the submitted field name (e.g. `userId`).
pub type RawInput = BTreeMap<String, String>;

/// Length constraint for a single required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Submitted field name.
    pub field: &'static str,
    /// Minimum length in characters (inclusive).
    pub min: usize,
    /// Maximum length in characters (inclusive).
    pub max: usize,
}

impl FieldRule {
    /// A required field whose length must lie in `min..=max`.
    #[must_use]
    pub const fn required(field: &'static str, min: usize, max: usize) -> Self {
        Self { field, min, max }
    }

    /// Check one value against this rule.
    ///
    /// # Errors
    ///
    /// Returns the reason the value was rejected.
    pub fn check(&self, value: Option<&str>) -> Result<(), FieldReason> {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return Err(FieldReason::Required),
        };

        let len = value.chars().count();
        if len < self.min {
            return Err(FieldReason::TooShort { min: self.min });
        }
        if len > self.max {
            return Err(FieldReason::TooLong { max: self.max });
        }
        Ok(())
    }
}

/// Admin form: login identifier and display name.
pub const ADMIN_RULES: &[FieldRule] = &[
    FieldRule::required("userId", 1, 50),
    FieldRule::required("userName", 1, 10),
];

/// Category form.
pub const CATEGORY_RULES: &[FieldRule] = &[FieldRule::required("name", 1, 20)];

/// Brand form.
pub const BRAND_RULES: &[FieldRule] = &[FieldRule::required("name", 1, 20)];

/// Item form.
pub const ITEM_RULES: &[FieldRule] = &[
    FieldRule::required("name", 1, 10),
    FieldRule::required("description", 1, 50),
];

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldReason {
    /// Missing or empty.
    Required,
    /// Fewer characters than allowed.
    TooShort { min: usize },
    /// More characters than allowed.
    TooLong { max: usize },
    /// Value could not be interpreted (e.g. a negative price).
    Invalid { message: String },
    /// Refers to a record that does not exist.
    UnknownReference { id: i32 },
}

impl fmt::Display for FieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::TooShort { min } => write!(f, "must be at least {min} characters"),
            Self::TooLong { max } => write!(f, "must be at most {max} characters"),
            Self::Invalid { message } => f.write_str(message),
            Self::UnknownReference { id } => write!(f, "refers to unknown record {id}"),
        }
    }
}

/// A rejected field and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: FieldReason,
}

/// Every field-level failure found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// An empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, reason: FieldReason) {
        self.0.push(FieldError {
            field: field.into(),
            reason,
        });
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Reason recorded for `field`, if any.
    #[must_use]
    pub fn reason_for(&self, field: &str) -> Option<&FieldReason> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.reason)
    }

    /// Merge another error set into this one.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", e.field, e.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Evaluate `rules` against `input`, collecting every failing field.
///
/// # Errors
///
/// Returns `ValidationErrors` listing each field that broke its rule.
pub fn validate(input: &RawInput, rules: &[FieldRule]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for rule in rules {
        if let Err(reason) = rule.check(input.get(rule.field).map(String::as_str)) {
            errors.push(rule.field, reason);
        }
    }
    errors.into_result()
}
