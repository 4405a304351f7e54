// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form definitions and payload validation.
//!
//! Each form category has a static table mapping the site's logical field
//! names to the opaque `entry.<n>` identifiers of the external form. The
//! action URL is deployment configuration and lives in [`FormTarget`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Form category; each has its own rate-limit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormCategory {
    /// Contact / call-to-action form
    Cta,
    /// Careers application form
    Recruitment,
}

impl FormCategory {
    pub const ALL: [FormCategory; 2] = [FormCategory::Cta, FormCategory::Recruitment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cta => "cta",
            Self::Recruitment => "recruitment",
        }
    }

    pub fn schema(&self) -> &'static FormSchema {
        match self {
            Self::Cta => &CTA_FORM_CONFIG,
            Self::Recruitment => &RECRUITMENT_FORM_CONFIG,
        }
    }
}

impl fmt::Display for FormCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field is checked before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    /// http(s) URL typed by the user
    Url,
    /// Multiple values, sent as repeated keys
    List,
    /// URL of a file the service uploaded itself
    FileUrl,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub entry_id: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, entry_id: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        entry_id,
        kind,
        required,
    }
}

#[derive(Debug)]
pub struct FormSchema {
    pub category: FormCategory,
    pub fields: &'static [FieldSpec],
}

pub static CTA_FORM_CONFIG: FormSchema = FormSchema {
    category: FormCategory::Cta,
    fields: &[
        field("fullName", "entry.1211843157", FieldKind::Text, true),
        field("email", "entry.1045781291", FieldKind::Email, true),
        field("phone", "entry.1166974658", FieldKind::Phone, true),
        field("description", "entry.839337160", FieldKind::Text, false),
        field("interests", "entry.2005620554", FieldKind::List, false),
    ],
};

pub static RECRUITMENT_FORM_CONFIG: FormSchema = FormSchema {
    category: FormCategory::Recruitment,
    fields: &[
        field("fullName", "entry.1398240582", FieldKind::Text, true),
        field("email", "entry.1739013764", FieldKind::Email, true),
        field("phone", "entry.624195093", FieldKind::Phone, true),
        field("position", "entry.1556369182", FieldKind::Text, true),
        field("portfolio", "entry.479301265", FieldKind::Url, false),
        field("cvUrl", "entry.1824927963", FieldKind::FileUrl, true),
        field("message", "entry.1957116204", FieldKind::Text, false),
    ],
};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address in {0}")]
    InvalidEmail(&'static str),

    #[error("Invalid phone number in {0}")]
    InvalidPhone(&'static str),

    #[error("Invalid URL in {0}")]
    InvalidUrl(&'static str),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(f) | Self::InvalidEmail(f) | Self::InvalidPhone(f) | Self::InvalidUrl(f) => *f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// Logical field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: BTreeMap<String, FieldValue>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_text(name, value);
        self
    }

    pub fn with_list(mut self, name: &str, values: Vec<String>) -> Self {
        self.fields.insert(name.to_string(), FieldValue::List(values));
        self
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), FieldValue::Text(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

impl FormSchema {
    /// Validate user-supplied fields. `FileUrl` fields are filled in by the
    /// service after upload and are checked by [`FormSchema::validate`].
    pub fn validate_user_fields(&self, payload: &FormPayload) -> Result<(), ValidationError> {
        self.fields
            .iter()
            .filter(|spec| spec.kind != FieldKind::FileUrl)
            .try_for_each(|spec| check_field(spec, payload.get(spec.name)))
    }

    /// Validate every field, including uploaded file URLs.
    pub fn validate(&self, payload: &FormPayload) -> Result<(), ValidationError> {
        self.fields
            .iter()
            .try_for_each(|spec| check_field(spec, payload.get(spec.name)))
    }

    /// Encode as `(entry id, value)` pairs in table order. Blank values are
    /// skipped; list values repeat the key; unknown fields are dropped.
    pub fn encode(&self, payload: &FormPayload) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for spec in self.fields {
            match payload.get(spec.name) {
                Some(FieldValue::Text(value)) if !value.trim().is_empty() => {
                    pairs.push((spec.entry_id.to_string(), value.trim().to_string()));
                }
                Some(FieldValue::List(values)) => {
                    pairs.extend(
                        values
                            .iter()
                            .map(|v| v.trim())
                            .filter(|v| !v.is_empty())
                            .map(|v| (spec.entry_id.to_string(), v.to_string())),
                    );
                }
                _ => {}
            }
        }
        pairs
    }
}

fn check_field(spec: &FieldSpec, value: Option<&FieldValue>) -> Result<(), ValidationError> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ if spec.required => {
            debug!(field = spec.name, "Missing required field");
            return Err(ValidationError::MissingField(spec.name));
        }
        _ => return Ok(()),
    };

    let FieldValue::Text(text) = value else {
        return Ok(());
    };
    let text = text.trim();

    match spec.kind {
        FieldKind::Email if !is_valid_email(text) => Err(ValidationError::InvalidEmail(spec.name)),
        FieldKind::Phone if !is_valid_phone(text) => Err(ValidationError::InvalidPhone(spec.name)),
        FieldKind::Url | FieldKind::FileUrl if !is_http_url(text) => {
            Err(ValidationError::InvalidUrl(spec.name))
        }
        _ => Ok(()),
    }
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .rsplit_once('.')
            .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
            .unwrap_or(false)
}

/// 8 to 15 digits, optionally with `+`, spaces, dashes, dots and parentheses.
fn is_valid_phone(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')'));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    allowed && (8..=15).contains(&digits)
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Where a category's submissions are posted.
#[derive(Debug, Clone)]
pub struct FormTarget {
    pub schema: &'static FormSchema,
    pub action_url: Url,
}

impl FormTarget {
    pub fn new(category: FormCategory, action_url: Url) -> Self {
        Self {
            schema: category.schema(),
            action_url,
        }
    }

    pub fn category(&self) -> FormCategory {
        self.schema.category
    }
}
