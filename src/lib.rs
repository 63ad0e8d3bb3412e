//! Log in to an npm-compatible registry with a username and password, and
//! save the issued auth token to an `.npmrc` file.
//!
//! ```text
//! npmrc-login --registry https://registry.example.com \
//!     --username alice --password hunter2 --use
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches as _, Parser};
use directories::{BaseDirs, ProjectDirs};
use miette::{IntoDiagnostic, Result};
use npmrc_account::login::{login, LoginOptions};
use npmrc_account::npmrc::{self, NpmrcUpdate, NPMRC_FILE_NAME};
use npmrc_account::NpmrcAccountError;
use npmrc_config::{ArgMatches, LoginConfig, LoginConfigLayer, LoginConfigOptions};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use url::Url;

mod error;

pub use error::NpmrcLoginError;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct NpmrcLogin {
    /// Base URL of the registry to log in to.
    #[arg(long)]
    registry: Option<String>,

    /// Username to log in with.
    #[arg(long)]
    username: Option<String>,

    /// Password to log in with.
    #[arg(long)]
    password: Option<String>,

    /// Path to the .npmrc file, or to the directory containing it.
    /// [default: $HOME/.npmrc]
    #[arg(long)]
    npmrc: Option<PathBuf>,

    /// Also set the `registry=...` key in the .npmrc file.
    #[arg(long = "use")]
    use_registry: bool,

    /// Give up on the registry after this many seconds. Waits indefinitely
    /// by default.
    #[arg(long, value_name = "SECONDS")]
    fetch_timeout: Option<u64>,

    /// File to read configuration values from.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output level/directive. Supports plain loglevels (off, error,
    /// warn, info, debug, trace) as well as more advanced directives in the
    /// format `target[span{field=value}]=level`.
    #[arg(long, default_value = "warn")]
    loglevel: String,

    /// Disable all output
    #[arg(long, short)]
    quiet: bool,
}

impl NpmrcLogin {
    fn setup_logging(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(
                EnvFilter::builder()
                    .with_default_directive(if self.quiet {
                        LevelFilter::OFF.into()
                    } else {
                        self.loglevel.parse().into_diagnostic()?
                    })
                    .from_env_lossy(),
            )
            .init();
        Ok(())
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            ProjectDirs::from("", "", "npmrc-login")
                .map(|d| d.config_dir().join("npmrc-login.toml"))
        })
    }

    /// Parses the command line, layers in configuration and logs in.
    ///
    /// Usage errors and missing credentials are reported on stdout and exit
    /// the process with status 1.
    pub async fn load() -> Result<()> {
        let matches = match NpmrcLogin::command().try_get_matches() {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => {
                println!("{e}");
                std::process::exit(1);
            }
        };
        let mut cli = NpmrcLogin::from_arg_matches(&matches).into_diagnostic()?;
        let cfg = LoginConfigOptions::new()
            .global_config_file(cli.config_file())
            .load()?;
        cli.layer_config(&matches, &cfg)?;
        cli.setup_logging()?;

        let settings = match cli.into_settings() {
            Ok(settings) => settings,
            Err(NpmrcLoginError::MissingCredentials) => {
                println!("{}", NpmrcLoginError::MissingCredentials);
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        };
        settings.execute().await
    }

    /// Resolves the parsed (and layered) arguments into the values a login
    /// needs.
    pub fn into_settings(self) -> Result<LoginSettings, NpmrcLoginError> {
        let (Some(registry), Some(username), Some(password)) = (
            self.registry.filter(|s| !s.is_empty()),
            self.username.filter(|s| !s.is_empty()),
            self.password.filter(|s| !s.is_empty()),
        ) else {
            return Err(NpmrcLoginError::MissingCredentials);
        };
        let npmrc = match self.npmrc {
            Some(npmrc) => npmrc,
            None => BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(NPMRC_FILE_NAME))
                .ok_or(NpmrcLoginError::NoHomeDirectory)?,
        };
        Ok(LoginSettings {
            registry,
            username,
            password,
            npmrc,
            use_registry: self.use_registry,
            fetch_timeout: self.fetch_timeout.map(Duration::from_secs),
            quiet: self.quiet,
        })
    }
}

impl LoginConfigLayer for NpmrcLogin {
    fn layer_config(&mut self, matches: &ArgMatches, config: &LoginConfig) -> Result<()> {
        if self.registry.is_none() {
            self.registry = npmrc_config::get_string(config, "registry")?;
        }
        if self.username.is_none() {
            self.username = npmrc_config::get_string(config, "username")?;
        }
        if self.password.is_none() {
            self.password = npmrc_config::get_string(config, "password")?;
        }
        if self.npmrc.is_none() {
            self.npmrc = npmrc_config::get_string(config, "npmrc")?.map(PathBuf::from);
        }
        if self.fetch_timeout.is_none() {
            self.fetch_timeout = npmrc_config::get_u64(config, "fetch_timeout")?;
        }
        if !npmrc_config::from_command_line(matches, "use_registry") {
            if let Some(use_registry) = npmrc_config::get_bool(config, "use")? {
                self.use_registry = use_registry;
            }
        }
        if !npmrc_config::from_command_line(matches, "loglevel") {
            if let Some(loglevel) = npmrc_config::get_string(config, "loglevel")? {
                self.loglevel = loglevel;
            }
        }
        Ok(())
    }
}

/// Everything a single login needs, resolved from the command line and
/// configuration.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub registry: String,
    pub username: String,
    pub password: String,
    pub npmrc: PathBuf,
    pub use_registry: bool,
    pub fetch_timeout: Option<Duration>,
    pub quiet: bool,
}

impl LoginSettings {
    /// Logs in and records the token. Nothing is written unless the login
    /// succeeds.
    pub async fn execute(self) -> Result<()> {
        let registry = Url::parse(&self.registry)
            .map_err(|e| NpmrcAccountError::InvalidRegistryUrl(e, self.registry.clone()))?;
        let host = npmrc::registry_host(&registry)?;

        tracing::info!("Logging in to {registry}");
        let token = login(
            &registry,
            &self.username,
            &self.password,
            &LoginOptions {
                client: None,
                fetch_timeout: self.fetch_timeout,
            },
        )
        .await?;
        tracing::info!("Logged in to {registry}");

        let written = npmrc::update_npmrc(
            &self.npmrc,
            &NpmrcUpdate {
                host,
                token: token.token,
                registry: self.registry,
                set_registry: self.use_registry,
            },
        )?;

        if !self.quiet {
            println!(
                "Login successful. Token added to {}.",
                written.display()
            );
        }
        Ok(())
    }
}
