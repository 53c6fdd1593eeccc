//! Field validation helpers shared by the `New*` inputs.

use crate::error::{RecordError, RecordResult};

/// Collects validation problems so a single response can list all of them.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Require a non-blank string.
    pub(crate) fn text(&mut self, field: &str, value: &Option<String>) -> &mut Self {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            self.errors.push(format!("{field} is required"));
        }
        self
    }

    /// Require any present value.
    pub(crate) fn present<T>(&mut self, field: &str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.errors.push(format!("{field} is required"));
        }
        self
    }

    /// Record a failed rule.
    pub(crate) fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    /// Require that an optional value looks like an email address.
    pub(crate) fn email(&mut self, field: &str, value: &Option<String>) -> &mut Self {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            self.check(looks_like_email(v), format!("{field} must be an email address"));
        }
        self
    }

    pub(crate) fn finish(&mut self) -> RecordResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(RecordError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Trim a value that validation has already required.
pub(crate) fn required(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Trim an optional value, dropping it when blank.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Normalize an email address for storage and uniqueness checks.
pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
