use std::fmt;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::notify::Notify;
use crate::{RegistryClient, RegistryClientError};

/// An auth token issued by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

#[derive(Serialize)]
struct LoginCouch<'a> {
    name: &'a str,
    password: &'a str,
}

/// A response field that is either of the expected type or anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Field<T> {
    Expected(T),
    Unexpected(Value),
}

#[derive(Debug, Deserialize)]
struct LoginCouchResponse {
    #[serde(default)]
    ok: Option<Field<String>>,
    #[serde(default)]
    token: Option<Field<String>>,
}

/// Renders the `ok` field for error messages, `<nil>` when absent.
struct OkFlag<'a>(&'a Option<Field<String>>);

impl fmt::Display for OkFlag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(Field::Expected(ok)) => write!(f, "{ok}"),
            Some(Field::Unexpected(ok)) => write!(f, "{ok}"),
            None => write!(f, "<nil>"),
        }
    }
}

impl RegistryClient {
    fn login_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("npm-auth-type", HeaderValue::from_static("legacy"));
        headers.insert("npm-command", HeaderValue::from_static("login"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// `<registry>/-/user/org.couchdb.user:<username>`, with the username
    /// percent-encoded.
    pub fn login_url(&self, username: &str) -> Result<Url, RegistryClientError> {
        let username = utf8_percent_encode(username, NON_ALPHANUMERIC);
        let registry = self.registry.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{registry}/-/user/org.couchdb.user:{username}"
        ))?)
    }

    /// Exchanges a username and password for an auth token.
    ///
    /// The status code is not consulted: whatever the registry answers is
    /// parsed, and only a body of the form `{"ok": "true", "token": "..."}`
    /// counts as a successful login. `ok` is compared as a string, so a
    /// boolean `true` is treated as a failed login.
    pub async fn login_couch(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Token, RegistryClientError> {
        let url = self.login_url(username)?;
        let body = serde_json::to_vec(&LoginCouch {
            name: username,
            password,
        })
        .map_err(RegistryClientError::SerializeError)?;

        let text = self
            .client
            .put(url.clone())
            .headers(Self::login_headers())
            .body(body)
            .send()
            .await?
            .notify()
            .text()
            .await?;

        parse_login_response(&url, text)
    }
}

fn parse_login_response(url: &Url, text: String) -> Result<Token, RegistryClientError> {
    let fields = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(RegistryClientError::UnexpectedResponse(url.to_string())),
        Err(e) => return Err(RegistryClientError::from_json_err(e, url.to_string(), text)),
    };
    let response = serde_json::from_value::<LoginCouchResponse>(Value::Object(fields))
        .map_err(|e| RegistryClientError::from_json_err(e, url.to_string(), text))?;

    match &response.ok {
        Some(Field::Expected(ok)) if ok == "true" => {}
        ok => {
            return Err(RegistryClientError::LoginFailed(
                OkFlag(ok).to_string(),
            ))
        }
    }

    match response.token {
        Some(Field::Expected(token)) => Ok(Token { token }),
        _ => Err(RegistryClientError::MissingToken),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(mock_server: &MockServer) -> Result<RegistryClient> {
        Ok(RegistryClient::new(
            mock_server.uri().parse().into_diagnostic()?,
        )?)
    }

    #[async_std::test]
    async fn login_couch() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;

        let _guard = Mock::given(method("PUT"))
            .and(path("/-/user/org.couchdb.user:test"))
            .and(header("content-type", "application/json"))
            .and(header("npm-command", "login"))
            .and(header("npm-auth-type", "legacy"))
            .and(body_json(json!({"name": "test", "password": "password"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"ok": "true", "token": "XXXXXX", "id": "x"})),
            )
            .expect(1)
            .mount_as_scoped(&mock_server)
            .await;

        assert_eq!(
            client.login_couch("test", "password").await?,
            Token {
                token: "XXXXXX".to_owned()
            }
        );

        Ok(())
    }

    #[async_std::test]
    async fn login_couch_escapes_credentials() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;
        let password = "p\"a\\ss\nw{o}rd ü";

        let _guard = Mock::given(method("PUT"))
            .and(path("/-/user/org.couchdb.user:a%20b"))
            .and(body_json(json!({"name": "a b", "password": password})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": "true", "token": "T"})),
            )
            .expect(1)
            .mount_as_scoped(&mock_server)
            .await;

        assert_eq!(client.login_couch("a b", password).await?.token, "T");

        Ok(())
    }

    #[async_std::test]
    async fn login_couch_ignores_status() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;

        {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(
                    ResponseTemplate::new(500).set_body_json(json!({"ok": "true", "token": "T"})),
                )
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            assert_eq!(client.login_couch("test", "pw").await?.token, "T");
        }

        {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(
                    ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})),
                )
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            assert!(
                matches!(
                    client.login_couch("test", "pw").await,
                    Err(RegistryClientError::LoginFailed(ok)) if ok == "<nil>"
                ),
                "A rejected login without an \"ok\" field is a failed login"
            );
        }

        Ok(())
    }

    #[async_std::test]
    async fn login_couch_requires_string_ok() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;

        for (body, reported) in [
            (json!({"ok": "false", "token": "T"}), "false"),
            (json!({"ok": true, "token": "T"}), "true"),
            (json!({"token": "T"}), "<nil>"),
            (json!({"ok": null, "token": "T"}), "<nil>"),
        ] {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(&body))
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            match client.login_couch("test", "pw").await {
                Err(RegistryClientError::LoginFailed(ok)) => assert_eq!(ok, reported),
                other => panic!("expected a failed login for {body}, got {other:?}"),
            }
        }

        Ok(())
    }

    #[async_std::test]
    async fn login_couch_requires_string_token() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;

        for body in [json!({"ok": "true"}), json!({"ok": "true", "token": 42})] {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(&body))
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            assert!(
                matches!(
                    client.login_couch("test", "pw").await,
                    Err(RegistryClientError::MissingToken)
                ),
                "{body} has no usable token"
            );
        }

        Ok(())
    }

    #[async_std::test]
    async fn login_couch_rejects_malformed_bodies() -> Result<()> {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await?;

        {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            assert!(matches!(
                client.login_couch("test", "pw").await,
                Err(RegistryClientError::BadJson { .. })
            ));
        }

        {
            let _guard = Mock::given(method("PUT"))
                .and(path("/-/user/org.couchdb.user:test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!(["true", "T"])))
                .expect(1)
                .mount_as_scoped(&mock_server)
                .await;

            assert!(
                matches!(
                    client.login_couch("test", "pw").await,
                    Err(RegistryClientError::UnexpectedResponse(_))
                ),
                "Arrays must not be read positionally into the response fields"
            );
        }

        Ok(())
    }

    #[test]
    fn login_url_does_not_double_slashes() -> Result<()> {
        let client = RegistryClient::new("https://reg.example.com/npm/".parse().into_diagnostic()?)?;
        assert_eq!(
            client.login_url("bob")?.as_str(),
            "https://reg.example.com/npm/-/user/org.couchdb.user:bob"
        );

        let client = RegistryClient::new("http://localhost:4873".parse().into_diagnostic()?)?;
        assert_eq!(
            client.login_url("bob")?.as_str(),
            "http://localhost:4873/-/user/org.couchdb.user:bob"
        );
        Ok(())
    }
}
