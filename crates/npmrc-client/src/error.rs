use miette::{Diagnostic, NamedSource, SourceOffset};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryClientError {
    #[error(transparent)]
    #[diagnostic(code(npmrc_client::url_parse_error))]
    UrlParseError(#[from] url::ParseError),

    /// The request could not be sent, or its response could not be read.
    #[error("Request failed: {0}")]
    #[diagnostic(
        code(npmrc_client::request_error),
        help("Check that the registry URL is correct and reachable.")
    )]
    RequestError(#[from] reqwest::Error),

    /// The login request body could not be encoded.
    #[error("Failed to encode login request: {0}")]
    #[diagnostic(code(npmrc_client::serialize_error))]
    SerializeError(#[source] serde_json::Error),

    /// The registry answered with something that isn't JSON.
    #[error("{source}\n\n  {url}")]
    #[diagnostic(code(npmrc_client::bad_json))]
    BadJson {
        source: serde_json::Error,
        url: String,
        #[source_code]
        json: NamedSource,
        #[label("here")]
        err_loc: (usize, usize),
    },

    /// The registry answered with JSON, but not with an object.
    #[error("Registry response from {0} is not a JSON object.")]
    #[diagnostic(code(npmrc_client::unexpected_response))]
    UnexpectedResponse(String),

    /// The `ok` field of the login response was absent or was not the
    /// string `"true"`.
    #[error("Login failed. Response: {0}")]
    #[diagnostic(
        code(npmrc_client::login_failed),
        help("Double-check your username and password.")
    )]
    LoginFailed(String),

    /// The login response did not carry a string `token` field.
    #[error("Token not found in response.")]
    #[diagnostic(code(npmrc_client::missing_token))]
    MissingToken,
}

impl RegistryClientError {
    pub fn from_json_err(err: serde_json::Error, url: String, json: String) -> Self {
        let offset = SourceOffset::from_location(&json, err.line(), err.column()).offset();
        Self::BadJson {
            source: err,
            url: url.clone(),
            json: NamedSource::new(url, json),
            err_loc: (offset, 0),
        }
    }
}
