//! API key storage.
//!
//! The key is a single secret string in a per-user file. `DOCQA_API_KEY`
//! overrides the file when set and non-empty.

use std::path::Path;

use crate::error::{DocqaError, Result};

pub const API_KEY_ENV: &str = "DOCQA_API_KEY";

/// Read the API key, preferring the environment over the file.
pub fn load_key(path: &Path) -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    read_key_file(path)
}

/// Read the API key from `path` only. Missing or blank is an error.
pub fn read_key_file(path: &Path) -> Result<String> {
    let missing = || DocqaError::MissingCredential {
        path: path.to_path_buf(),
    };
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(e.into()),
    };
    let key = content.trim();
    if key.is_empty() {
        return Err(missing());
    }
    Ok(key.to_string())
}

/// Write `key` to `path`, creating the parent directory.
///
/// On Unix the file is restricted to the owner (`0600`).
pub fn store_key(path: &Path, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(DocqaError::MissingCredential {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, key)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
