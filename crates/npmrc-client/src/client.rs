use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::RegistryClientError;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Configures a [`RegistryClient`].
#[derive(Clone, Debug)]
pub struct RegistryClientBuilder {
    registry: Option<Url>,
    timeout: Option<Duration>,
    user_agent: String,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            timeout: None,
            user_agent: concat!("npmrc-login/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL of the registry. Defaults to the public npm registry.
    pub fn registry(mut self, registry: Url) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Overall request timeout. Requests wait indefinitely when unset.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl AsRef<str>) -> Self {
        self.user_agent = user_agent.as_ref().to_owned();
        self
    }

    pub fn build(self) -> Result<RegistryClient, RegistryClientError> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Url::parse(DEFAULT_REGISTRY)?,
        };
        let mut client = ClientBuilder::new().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        Ok(RegistryClient {
            registry: Arc::new(registry),
            client: client.build()?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RegistryClient {
    pub(crate) registry: Arc<Url>,
    pub(crate) client: Client,
}

impl RegistryClient {
    pub fn new(registry: Url) -> Result<Self, RegistryClientError> {
        RegistryClientBuilder::new().registry(registry).build()
    }

    pub fn registry(&self) -> &Url {
        &self.registry
    }

    pub fn with_registry(&self, registry: Url) -> Self {
        Self {
            registry: Arc::new(registry),
            client: self.client.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_to_public_registry() -> Result<()> {
        let client = RegistryClientBuilder::new().build()?;
        assert_eq!(client.registry().as_str(), DEFAULT_REGISTRY);
        Ok(())
    }

    #[test]
    fn with_registry_swaps_base_url() -> Result<()> {
        let client = RegistryClient::new("https://one.example.com".parse().into_diagnostic()?)?;
        let other = client.with_registry("https://two.example.com/npm/".parse().into_diagnostic()?);
        assert_eq!(client.registry().as_str(), "https://one.example.com/");
        assert_eq!(other.registry().as_str(), "https://two.example.com/npm/");
        Ok(())
    }
}
