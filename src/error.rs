use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NpmrcLoginError {
    /// One or more of the values needed to log in was neither passed on the
    /// command line nor found in the environment or config file.
    #[error("All flags --registry, --username, and --password are required.")]
    #[diagnostic(code(npmrc_login::missing_credentials), url(docsrs))]
    MissingCredentials,

    /// `--npmrc` wasn't given and there's no home directory to default to.
    #[error("Could not determine a home directory for the default .npmrc location.")]
    #[diagnostic(
        code(npmrc_login::no_home_directory),
        url(docsrs),
        help("Pass --npmrc with the path to your .npmrc file.")
    )]
    NoHomeDirectory,
}
