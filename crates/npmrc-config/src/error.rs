use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LoginConfigError {
    #[error(transparent)]
    #[diagnostic(code(npmrc_config::error))]
    ConfigError(#[from] config::ConfigError),

    /// A setting was present but had the wrong shape.
    #[error("Invalid value for `{0}`: {1}")]
    #[diagnostic(code(npmrc_config::invalid_value))]
    InvalidValue(String, String),
}
