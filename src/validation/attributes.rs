// attributes.rs

use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// Objects whose optional attributes can be queried by name.
pub trait HasAttributes {
    type Field: Copy + fmt::Display;

    fn has_attribute(&self, field: Self::Field) -> bool;

    /// How the object is named in error messages.
    fn attribute_owner(&self) -> String;
}

/// Fail on the first field of `fields` that `object` does not carry.
///
/// When `message` is given it replaces the generic "not set" text, which lets
/// callers explain why a parameter is needed.
pub fn verify_attributes<T: HasAttributes + ?Sized>(
    object: &T,
    fields: &[T::Field],
    message: Option<&str>,
) -> ConfigResult<()> {
    match fields.iter().find(|field| !object.has_attribute(**field)) {
        Some(field) => {
            let field = field.to_string();
            Err(ConfigError::MissingAttribute {
                owner: object.attribute_owner(),
                message: message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("required attribute `{field}` is not set")),
                field,
            })
        }
        None => Ok(()),
    }
}
