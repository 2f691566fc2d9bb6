// identity.rs

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::checks::{non_blank, TypeIssue};

/// Name and ids shared by most simulator objects.
///
/// Internal ids are unique and assigned by the simulator. External ids and
/// names are chosen by users, so uniqueness is only enforced where a
/// container needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentity {
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub internal_id: Option<i64>,
}

impl ObjectIdentity {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            external_id: Some(external_id.into()),
            internal_id: None,
        }
    }

    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Make sure both the name and the external id are set.
    ///
    /// When only one of them is present the other is copied from it and a
    /// warning is logged. Having neither is an error.
    pub fn resolve_name_and_external_id(&mut self, kind: &str) -> ConfigResult<()> {
        match (self.name.clone(), self.external_id.clone()) {
            (Some(_), Some(_)) => Ok(()),
            (Some(name), None) => {
                warn!("{kind} `{name}` has no external id, using its name instead");
                self.external_id = Some(name);
                Ok(())
            }
            (None, Some(external_id)) => {
                warn!("{kind} `{external_id}` has no name, using its external id instead");
                self.name = Some(external_id);
                Ok(())
            }
            (None, None) => Err(ConfigError::MissingIdentity {
                kind: kind.to_string(),
            }),
        }
    }

    pub(crate) fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("external_id", self.external_id.as_ref()).or_else(|| match self.internal_id {
            Some(id) if id < 0 => Some(TypeIssue::new("internal_id", format!("must not be negative ({id})"))),
            _ => None,
        })
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.external_id.as_deref().unwrap_or("<no external id>")
        )?;
        if let Some(id) = self.internal_id {
            write!(f, " #{id}")?;
        }
        Ok(())
    }
}
