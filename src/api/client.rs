use reqwest::{Method, StatusCode};
use snafu::prelude::*;

use super::error::variant::*;
use super::types::*;
use super::Result;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Chat HTTP API Client
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// create a new api client against `endpoint`, authorized by an id token
    pub fn new<E, S>(endpoint: &E, id_token: &S) -> Result<Self>
    where
        E: AsRef<str> + ?Sized,
        S: AsRef<str> + ?Sized,
    {
        let auth_header_value = format!("Bearer {}", id_token.as_ref())
            .parse()
            .map_err(|_| TokenInvalid.build())?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth_header_value);

        let client = reqwest::Client::builder()
            .gzip(true)
            .deflate(true)
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()
            .context(ClientCreateFailed)?;

        Ok(Self {
            client,
            base_url: endpoint.as_ref().trim_end_matches('/').to_string(),
        })
    }

    async fn request<R, P>(&self, path: &P) -> Result<R>
    where
        P: AsRef<str> + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path.as_ref());
        let req = self.client.get(&url).build().context(BuildRequestFailed)?;

        let resp = self
            .client
            .execute(req)
            .await
            .with_context(|_| RequestFailed {
                method: Method::GET,
                url: &url,
            })?;

        ensure!(
            resp.status() == StatusCode::OK,
            HTTPStatusNotOK {
                method: Method::GET,
                url: &url,
                status_code: resp.status()
            }
        );

        let body = resp.bytes().await.with_context(|_| RequestFailed {
            method: Method::GET,
            url: &url,
        })?;

        serde_json::from_slice(&body).with_context(|_| ParseBodyFailed { body })
    }

    /// Call /socket-connection, get realtime socket url
    pub async fn socket_connection(&self) -> Result<SocketConnection> {
        self.request("/socket-connection").await
    }
}
