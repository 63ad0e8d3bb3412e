//! Line-oriented updates to `.npmrc` files.
//!
//! Only two directive shapes are recognized:
//!
//! ```text
//! registry=https://registry.example.com
//! //registry.example.com/:_authToken=<token>
//! ```
//!
//! Every other line is passed through untouched, in its original position.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::NpmrcAccountError;

pub const NPMRC_FILE_NAME: &str = ".npmrc";

/// The entries to upsert into an `.npmrc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmrcUpdate {
    /// `host[:port]` the auth token is keyed by.
    pub host: String,
    pub token: String,
    /// Registry URL exactly as the user gave it.
    pub registry: String,
    /// Also point `registry=` at `registry`.
    pub set_registry: bool,
}

impl NpmrcUpdate {
    fn auth_prefix(&self) -> String {
        format!("//{}/:_authToken=", self.host)
    }

    pub fn auth_line(&self) -> String {
        format!("{}{}", self.auth_prefix(), self.token)
    }

    pub fn registry_line(&self) -> String {
        format!("registry={}", self.registry)
    }
}

/// A directory means the `.npmrc` inside it; anything else is used as is.
pub fn resolve_npmrc_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(NPMRC_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// The `host[:port]` part of a registry URL. Default ports are not included.
pub fn registry_host(registry: &Url) -> Result<String, NpmrcAccountError> {
    let host = registry
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| NpmrcAccountError::MissingHost(registry.to_string()))?;
    Ok(match registry.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

/// Applies `update` to the text of an `.npmrc`.
///
/// Every auth line for the host is replaced in place, and, when
/// `set_registry` is on, so is every `registry=` line. A missing auth line
/// is appended. The registry line is appended unless the text already
/// contains it anywhere, even as part of another line.
///
/// A single trailing newline terminates the last line rather than starting
/// an empty one, so the result never ends in a newline.
pub fn upsert_npmrc(content: &str, update: &NpmrcUpdate) -> String {
    let auth_prefix = update.auth_prefix();
    let auth_line = update.auth_line();
    let registry_line = update.registry_line();

    let content = content.strip_suffix('\n').unwrap_or(content);
    let mut lines: Vec<String> = if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').map(str::to_owned).collect()
    };

    let mut auth_found = false;
    for line in lines.iter_mut() {
        if line.starts_with(&auth_prefix) {
            *line = auth_line.clone();
            auth_found = true;
        }
        if update.set_registry && line.starts_with("registry=") {
            *line = registry_line.clone();
        }
    }

    if !auth_found {
        lines.push(auth_line);
    }
    if update.set_registry && !lines.join("\n").contains(&registry_line) {
        lines.push(registry_line);
    }

    lines.join("\n")
}

/// Reads the `.npmrc` at `path` (or inside it, for a directory), applies
/// `update` and writes the result back. A missing file counts as empty.
///
/// Returns the path of the file that was written.
pub fn update_npmrc(path: &Path, update: &NpmrcUpdate) -> Result<PathBuf, NpmrcAccountError> {
    let path = resolve_npmrc_path(path);
    tracing::debug!("Updating {}", path.display());

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(NpmrcAccountError::NpmrcReadError(e, path)),
    };

    let updated = upsert_npmrc(&content, update);
    write_npmrc(&path, &updated).map_err(|e| NpmrcAccountError::NpmrcWriteError(e, path.clone()))?;
    Ok(path)
}

fn write_npmrc(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()
}
