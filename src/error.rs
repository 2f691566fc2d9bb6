// error.rs

use std::path::PathBuf;

/// Why a lookup against the simulator catalog failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceFailure {
    #[error("no object found")]
    NotFound,
    #[error("{0} objects share this id")]
    Ambiguous(usize),
    #[error("expected a {expected} but found a {found}")]
    WrongType { expected: String, found: String },
}

/// Every failure the configuration layer can surface.
///
/// Nothing is recovered locally: callers either bubble the error up or, in
/// the binaries, print it and exit.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parent directory of {} does not exist", .path.display())]
    ParentDirectoryNotFound { path: PathBuf },

    #[error("{} does not have the .{expected} extension", .path.display())]
    WrongExtension { path: PathBuf, expected: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode {context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file format version {found} is not supported (this build reads up to {supported})")]
    UnsupportedFormatVersion { found: u32, supported: u32 },

    #[error("file holds a `{found}` record but a `{expected}` was requested")]
    WrongKind { expected: String, found: String },

    #[error("{owner}: {message}")]
    MissingAttribute {
        owner: String,
        field: String,
        message: String,
    },

    #[error("{kind} has neither a name nor an external id")]
    MissingIdentity { kind: String },

    #[error("{context}{}: invalid `{field}` ({reason})", at_index(.index))]
    WrongType {
        context: String,
        index: Option<usize>,
        field: String,
        reason: String,
    },

    #[error("{message}")]
    EmptyCollection { kind: String, message: String },

    #[error("{owner} already holds an object with external id `{external_id}`")]
    DuplicateExternalId { owner: String, external_id: String },

    #[error("{owner}: `{external_id}` does not resolve to exactly one {target}")]
    UnresolvedReference {
        owner: String,
        target: String,
        external_id: String,
    },

    #[error("external reference `{id}`: {failure}")]
    ExternalReference { id: String, failure: ReferenceFailure },

    #[error("database {} is not empty", .0.display())]
    DatabaseNotEmpty(PathBuf),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("could not parse settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" element {i}"),
        None => String::new(),
    }
}

impl ConfigError {
    pub fn missing(owner: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        ConfigError::MissingAttribute {
            owner: owner.into(),
            message: format!("required attribute `{field}` is not set"),
            field,
        }
    }

    pub fn wrong_type(
        context: impl Into<String>,
        index: Option<usize>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::WrongType {
            context: context.into(),
            index,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for the errors raised while checking an object before it is
    /// written or after it is read, as opposed to I/O and format problems.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ConfigError::MissingAttribute { .. }
                | ConfigError::MissingIdentity { .. }
                | ConfigError::WrongType { .. }
                | ConfigError::EmptyCollection { .. }
                | ConfigError::DuplicateExternalId { .. }
                | ConfigError::UnresolvedReference { .. }
        )
    }
}
