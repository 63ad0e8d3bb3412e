use std::time::Duration;

use npmrc_client::login::Token;
use npmrc_client::{RegistryClient, RegistryClientBuilder};
use url::Url;

use crate::error::NpmrcAccountError;

#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Client to log in with. One is built from `registry` when unset.
    pub client: Option<RegistryClient>,
    /// Request timeout for a freshly built client.
    pub fetch_timeout: Option<Duration>,
}

/// Logs in to `registry` with a username and password, returning the issued
/// auth token. Every failure is terminal; there are no retries.
pub async fn login(
    registry: &Url,
    username: &str,
    password: &str,
    options: &LoginOptions,
) -> Result<Token, NpmrcAccountError> {
    let client = match &options.client {
        Some(client) => client.with_registry(registry.clone()),
        None => RegistryClientBuilder::new()
            .registry(registry.clone())
            .timeout(options.fetch_timeout)
            .build()?,
    };
    tracing::debug!("Requesting token for {username} from {registry}");
    Ok(client.login_couch(username, password).await?)
}
