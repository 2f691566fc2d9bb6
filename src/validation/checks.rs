// checks.rs

use log::debug;
use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// A present attribute holding a value its record cannot accept.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeIssue {
    /// Path of the attribute inside the record, e.g. `phases[1].signals[0].signal`.
    pub field: String,
    pub reason: String,
}

impl TypeIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field with the list element it was found in.
    pub fn within(self, list: &str, index: usize) -> Self {
        Self {
            field: format!("{list}[{index}].{}", self.field),
            reason: self.reason,
        }
    }

    pub fn within_record(self, record: &str) -> Self {
        Self {
            field: format!("{record}.{}", self.field),
            reason: self.reason,
        }
    }
}

impl fmt::Display for TypeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.reason)
    }
}

/// Shared contract of the value records.
pub trait CheckedRecord {
    /// Label used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Required attributes that are not set, nested ones as paths.
    fn missing_attributes(&self) -> Vec<String>;

    /// First present attribute whose value is not acceptable.
    fn type_issue(&self) -> Option<TypeIssue>;

    fn check_attributes_type(&self) -> bool {
        match self.type_issue() {
            Some(issue) => {
                debug!("{} failed its type check: {}", Self::TYPE_NAME, issue);
                false
            }
            None => true,
        }
    }
}

/// Unwrap a required attribute or report it as missing.
pub fn require<'a, T>(value: &'a Option<T>, owner: &str, field: &str) -> ConfigResult<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ConfigError::missing(owner, field))
}

/// Like `require`, and the text must not be blank.
pub fn require_text<'a>(value: &'a Option<String>, owner: &str, field: &str) -> ConfigResult<&'a str> {
    let text = require(value, owner, field)?;
    if text.trim().is_empty() {
        return Err(ConfigError::wrong_type(owner, None, field, "must not be empty"));
    }
    Ok(text)
}

/// Check one nested record that is not part of a list.
pub fn check_record<T: CheckedRecord>(owner: &str, field: &str, record: &T) -> ConfigResult<()> {
    if let Some(missing) = record.missing_attributes().into_iter().next() {
        return Err(ConfigError::missing(format!("{owner} {field}"), missing));
    }
    match record.type_issue() {
        Some(issue) => Err(ConfigError::wrong_type(
            owner,
            None,
            format!("{field}.{}", issue.field),
            issue.reason,
        )),
        None => Ok(()),
    }
}

/// Check every element of a list in order and stop at the first bad one.
pub fn validate_list<T: CheckedRecord>(owner: &str, list_field: &str, items: &[T]) -> ConfigResult<()> {
    for (index, item) in items.iter().enumerate() {
        if let Some(missing) = item.missing_attributes().into_iter().next() {
            return Err(ConfigError::missing(
                format!("{owner} {list_field}[{index}] ({})", T::TYPE_NAME),
                missing,
            ));
        }
        if let Some(issue) = item.type_issue() {
            return Err(ConfigError::wrong_type(
                format!("{owner} {list_field}"),
                Some(index),
                issue.field,
                issue.reason,
            ));
        }
    }
    Ok(())
}

pub(crate) fn note_missing<T>(missing: &mut Vec<String>, field: &str, value: &Option<T>) {
    if value.is_none() {
        missing.push(field.to_string());
    }
}

pub(crate) fn note_missing_nested<T: CheckedRecord>(missing: &mut Vec<String>, list: &str, items: &[T]) {
    for (index, item) in items.iter().enumerate() {
        for field in item.missing_attributes() {
            missing.push(format!("{list}[{index}].{field}"));
        }
    }
}

pub(crate) fn first_nested_issue<T: CheckedRecord>(list: &str, items: &[T]) -> Option<TypeIssue> {
    items
        .iter()
        .enumerate()
        .find_map(|(index, item)| item.type_issue().map(|issue| issue.within(list, index)))
}

pub(crate) fn finite(field: &str, value: Option<f64>) -> Option<TypeIssue> {
    match value {
        Some(v) if !v.is_finite() => Some(TypeIssue::new(field, format!("is not a finite number ({v})"))),
        _ => None,
    }
}

pub(crate) fn non_negative(field: &str, value: Option<f64>) -> Option<TypeIssue> {
    finite(field, value).or_else(|| match value {
        Some(v) if v < 0.0 => Some(TypeIssue::new(field, format!("must not be negative ({v})"))),
        _ => None,
    })
}

pub(crate) fn non_negative_int(field: &str, value: Option<i64>) -> Option<TypeIssue> {
    match value {
        Some(v) if v < 0 => Some(TypeIssue::new(field, format!("must not be negative ({v})"))),
        _ => None,
    }
}

pub(crate) fn non_blank(field: &str, value: Option<&String>) -> Option<TypeIssue> {
    match value {
        Some(text) if text.trim().is_empty() => Some(TypeIssue::new(field, "must not be empty")),
        _ => None,
    }
}
