use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://osu.ppy.sh/api/get_user";

/// Result of looking a player up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The API returned no account: the player is still restricted.
    NotFound,
    /// The account is visible again, under this username.
    Found { username: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network or server trouble worth retrying.
    #[error("request failed: {0}")]
    Transient(String),
    /// The API answered with an explicit error message (bad key, …).
    #[error("{0}")]
    Api(String),
    #[error("Failed to decode response.")]
    Decode,
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Looks up a player's account status.
pub trait StatusFetcher: Send + Sync {
    fn fetch(&self, api_key: &str, player: &str) -> Result<Lookup, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

/// Interpret a `get_user` response body.
pub fn parse_lookup(body: &str) -> Result<Lookup, FetchError> {
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        if !err.error.is_empty() {
            return Err(FetchError::Api(err.error));
        }
    }

    let users: Vec<ApiUser> = serde_json::from_str(body).map_err(|_| FetchError::Decode)?;
    // TODO: let the user pick when a name matches several accounts
    Ok(match users.into_iter().next() {
        Some(user) => Lookup::Found {
            username: user.username,
        },
        None => Lookup::NotFound,
    })
}

/// [`StatusFetcher`] backed by the osu! v1 HTTP API.
#[derive(Debug, Clone)]
pub struct OsuFetcher {
    client: reqwest::blocking::Client,
    api_url: String,
}

impl OsuFetcher {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

impl StatusFetcher for OsuFetcher {
    fn fetch(&self, api_key: &str, player: &str) -> Result<Lookup, FetchError> {
        // The key is a credential; keep it out of the log
        log::info!("GET {}?u={player}", self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("k", api_key), ("u", player)])
            .send()
            .map_err(|err| FetchError::Transient(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::Transient(status.to_string()));
        }

        let body = response
            .text()
            .map_err(|err| FetchError::Transient(err.to_string()))?;
        log::debug!("response ({status}): {body}");

        parse_lookup(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_means_not_found() {
        assert_eq!(parse_lookup("[]"), Ok(Lookup::NotFound));
    }

    #[test]
    fn first_user_wins() {
        let body = r#"[{"user_id":"948713","username":"Hakurei Reimu-","pp_rank":"1"},
                       {"user_id":"2","username":"other"}]"#;
        assert_eq!(
            parse_lookup(body),
            Ok(Lookup::Found {
                username: "Hakurei Reimu-".into()
            })
        );
    }

    #[test]
    fn error_object_is_an_api_error() {
        assert_eq!(
            parse_lookup(r#"{"error":"Please provide a valid API key."}"#),
            Err(FetchError::Api("Please provide a valid API key.".into()))
        );
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert_eq!(parse_lookup("<html>502</html>"), Err(FetchError::Decode));
        assert_eq!(parse_lookup(r#"{"error":""}"#), Err(FetchError::Decode));
    }

    #[test]
    fn only_transport_errors_are_transient() {
        assert!(FetchError::Transient("reset".into()).is_transient());
        assert!(!FetchError::Api("bad key".into()).is_transient());
        assert!(!FetchError::Decode.is_transient());
    }

    // The blocking client must be built, used and dropped off the async
    // workers, so each call goes through spawn_blocking.
    mod http {
        use super::super::*;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn fetch_from(server: &MockServer, player: &str) -> Result<Lookup, FetchError> {
            let url = format!("{}/api/get_user", server.uri());
            let player = player.to_string();
            tokio::task::spawn_blocking(move || {
                let fetcher = OsuFetcher::new(url, Duration::from_secs(5)).unwrap();
                fetcher.fetch("secret", &player)
            })
            .await
            .unwrap()
        }

        #[tokio::test]
        async fn sends_key_and_player_as_query() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/get_user"))
                .and(query_param("k", "secret"))
                .and(query_param("u", "peppy"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(r#"[{"username":"peppy"}]"#),
                )
                .mount(&server)
                .await;

            assert_eq!(
                fetch_from(&server, "peppy").await,
                Ok(Lookup::Found {
                    username: "peppy".into()
                })
            );
        }

        #[tokio::test]
        async fn server_error_is_transient() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let err = fetch_from(&server, "peppy").await.unwrap_err();
            assert!(err.is_transient());
        }

        #[tokio::test]
        async fn api_error_body_is_reported() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(401).set_body_string(r#"{"error":"Invalid API key"}"#),
                )
                .mount(&server)
                .await;

            assert_eq!(
                fetch_from(&server, "peppy").await,
                Err(FetchError::Api("Invalid API key".into()))
            );
        }
    }
}
