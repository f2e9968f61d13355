use crate::error::{Error, Result};
use crate::platform;
use std::fs;
use std::path::PathBuf;

/// Expands `~`, `~/path` and `~user/path` to absolute paths. Other paths are
/// returned unchanged.
pub fn expand_user(path: &str) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) => rest,
        None => return Ok(PathBuf::from(path)),
    };

    let (user, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };

    let home = if user.is_empty() {
        platform::home_dir(None)
    } else {
        platform::home_dir(Some(user))
    };

    match home {
        Some(home) if tail.is_empty() => Ok(home),
        Some(home) => Ok(home.join(tail)),
        None => Err(Error::UnknownUser(format!("~{}", user))),
    }
}

/// True if `path` names an existing local file or directory.
pub fn exists(path: &str) -> bool {
    match expand_user(path) {
        Ok(path) => fs::metadata(path).is_ok(),
        Err(_) => false,
    }
}
