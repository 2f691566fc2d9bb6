// paths.rs

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Check that `path` can hold a configuration file: its parent directory must
/// exist and its last extension must be `extension`.
pub fn verify_filepath(path: &Path, extension: &str) -> ConfigResult<()> {
    // A bare file name lives in the working directory.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(ConfigError::ParentDirectoryNotFound {
            path: path.to_path_buf(),
        });
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext == extension => Ok(()),
        _ => Err(ConfigError::WrongExtension {
            path: path.to_path_buf(),
            expected: extension.to_string(),
        }),
    }
}
