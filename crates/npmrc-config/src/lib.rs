//! Settings for `npmrc-login`, layered from a global config file and
//! `NPMRC_LOGIN_*` environment variables underneath the command line.

use std::path::PathBuf;

use clap::parser::ValueSource;
pub use clap::ArgMatches;
pub use config::Config as LoginConfig;
use config::{ConfigError, Environment, File};
use miette::Result;

mod error;

pub use error::LoginConfigError;

pub const ENV_PREFIX: &str = "npmrc_login";

/// Fills in values that weren't given on the command line from `config`.
pub trait LoginConfigLayer {
    fn layer_config(&mut self, _matches: &ArgMatches, _config: &LoginConfig) -> Result<()> {
        Ok(())
    }
}

/// Whether the argument `id` was explicitly passed on the command line, as
/// opposed to coming from its default.
pub fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

fn optional<T>(value: std::result::Result<T, ConfigError>) -> Result<Option<T>, LoginConfigError> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_string(config: &LoginConfig, key: &str) -> Result<Option<String>, LoginConfigError> {
    optional(config.get_string(key))
}

pub fn get_bool(config: &LoginConfig, key: &str) -> Result<Option<bool>, LoginConfigError> {
    optional(config.get_bool(key))
}

pub fn get_u64(config: &LoginConfig, key: &str) -> Result<Option<u64>, LoginConfigError> {
    optional(config.get_int(key))?
        .map(|value| {
            u64::try_from(value)
                .map_err(|e| LoginConfigError::InvalidValue(key.to_owned(), e.to_string()))
        })
        .transpose()
}

pub struct LoginConfigOptions {
    global: bool,
    env: bool,
    global_config_file: Option<PathBuf>,
}

impl Default for LoginConfigOptions {
    fn default() -> Self {
        LoginConfigOptions {
            global: true,
            env: true,
            global_config_file: None,
        }
    }
}

impl LoginConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn env(mut self, env: bool) -> Self {
        self.env = env;
        self
    }

    pub fn global_config_file(mut self, file: Option<PathBuf>) -> Self {
        self.global_config_file = file;
        self
    }

    /// Environment variables take precedence over the config file. A missing
    /// config file is not an error.
    pub fn load(self) -> Result<LoginConfig, LoginConfigError> {
        let mut builder = LoginConfig::builder();
        if self.global {
            if let Some(config_file) = self.global_config_file {
                let path = config_file.display().to_string();
                builder = builder.add_source(File::with_name(&path[..]).required(false));
            }
        }
        if self.env {
            builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
        }
        Ok(builder.build()?)
    }
}
