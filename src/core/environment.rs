//! Variable expansion and executable lookup against the process environment.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::{Error, Result};

const SEARCH_PATH_VAR: &str = "PATH";

/// Expands a `$NAME` token to the value of `NAME`.
///
/// A token without the leading `$` is returned unchanged.
pub fn expand(token: &str) -> Result<String> {
    let name = match token.strip_prefix('$') {
        Some(name) => name,
        None => return Ok(token.to_string()),
    };

    env::var_os(name)
        .map(|value| value.to_string_lossy().into_owned())
        .ok_or_else(|| Error::undefined_variable(token))
}

/// Locates `name` using the `PATH` environment variable.
pub fn resolve_executable(name: &str) -> Result<PathBuf> {
    resolve_executable_in(name, env::var_os(SEARCH_PATH_VAR).as_deref())
}

/// Locates `name` in a colon-separated `search_path`.
///
/// A name containing `/` is used as-is and the search path is never read.
/// Otherwise each directory is tried in order and the first one holding a
/// regular file called `name` wins. Execute permission is not checked.
pub fn resolve_executable_in(name: &str, search_path: Option<&OsStr>) -> Result<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return if is_regular_file(&path) {
            Ok(path)
        } else {
            Err(Error::command_not_found(name))
        };
    }

    let search_path = match search_path {
        Some(search_path) if !search_path.is_empty() => search_path.to_string_lossy(),
        _ => return Err(Error::search_path_unset(name)),
    };

    search_path
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_regular_file(candidate))
        .map(|found| {
            debug!("resolved {} to {}", name, found.display());
            found
        })
        .ok_or_else(|| Error::command_not_found(name))
}

fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}
