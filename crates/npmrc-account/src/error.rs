use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NpmrcAccountError {
    /// An error was thrown by the registry client.
    #[error(transparent)]
    #[diagnostic(transparent)]
    ClientError(#[from] npmrc_client::RegistryClientError),

    /// The registry URL could not be parsed.
    #[error("Invalid registry URL `{1}`: {0}")]
    #[diagnostic(
        code(npmrc_account::invalid_registry_url),
        help("Pass a full URL, including the scheme, such as `https://registry.npmjs.org`.")
    )]
    InvalidRegistryUrl(#[source] url::ParseError, String),

    /// The registry URL has no host to key the auth token by.
    #[error("Registry URL `{0}` has no host.")]
    #[diagnostic(code(npmrc_account::missing_host))]
    MissingHost(String),

    /// Failed to read an existing .npmrc file.
    #[error("Error reading .npmrc file at {}: {0}", .1.display())]
    #[diagnostic(code(npmrc_account::npmrc_read_error))]
    NpmrcReadError(#[source] std::io::Error, PathBuf),

    /// Failed to write the updated .npmrc file.
    #[error("Error writing to .npmrc file at {}: {0}", .1.display())]
    #[diagnostic(code(npmrc_account::npmrc_write_error))]
    NpmrcWriteError(#[source] std::io::Error, PathBuf),
}
