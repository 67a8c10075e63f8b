//! Chat HTTP API response types

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use snafu::prelude::*;

/// data type for api /socket-connection
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConnection {
    /// realtime socket url
    pub url: String,
    /// server assigned connection id
    #[serde(rename = "connectionId", default)]
    pub connection_id: String,
}

/// Parse string as socket url error
#[derive(Debug, Snafu)]
#[snafu(
    visibility(pub(crate)),
    module(parse_socket_url_error_variant),
    context(suffix(false))
)]
pub enum ParseSocketUrlError {
    #[snafu(display("{s} is an invalid url: {source}"))]
    /// the str is not a valid url
    InvalidURL {
        /// string be parsed
        s: String,
        /// source error
        source: url::ParseError,
    },

    /// the parsed url schema is not websocket
    #[snafu(display("the url {s} has invalid schema {schema}, only ws or wss is ok"))]
    InvalidSchema {
        /// the url
        s: String,
        /// invalid schema
        schema: String,
    },

    /// the parsed url has no host
    #[snafu(display("the socket url {s} has no host"))]
    NoHost {
        /// the url
        s: String,
    },
}

/// Base url of the realtime socket, without credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketUrl {
    url: url::Url,
}

impl SocketUrl {
    /// construct the final url with the credential appended as `token` query pair
    pub fn with_token(&self, token: &str) -> url::Url {
        let mut u = self.url.clone();
        u.query_pairs_mut().append_pair("token", token);
        u
    }

    /// the base url
    pub fn as_url(&self) -> &url::Url {
        &self.url
    }
}

impl FromStr for SocketUrl {
    type Err = ParseSocketUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = url::Url::parse(s)
            .with_context(|_| parse_socket_url_error_variant::InvalidURL { s: s.to_string() })?;

        ensure!(
            url.scheme() == "wss" || url.scheme() == "ws",
            parse_socket_url_error_variant::InvalidSchema {
                s,
                schema: url.scheme(),
            }
        );

        ensure!(
            url.host().is_some(),
            parse_socket_url_error_variant::NoHost { s }
        );

        Ok(Self { url })
    }
}

impl Display for SocketUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_socket_url() {
        let u: SocketUrl = "wss://chat.example.com/prod".parse().unwrap();
        assert_eq!(u.as_url().host_str(), Some("chat.example.com"));
        assert_eq!(u.to_string(), "wss://chat.example.com/prod");
    }

    #[test]
    fn test_parse_socket_url_reject_http() {
        let err = "https://chat.example.com".parse::<SocketUrl>().unwrap_err();
        assert!(matches!(err, ParseSocketUrlError::InvalidSchema { .. }));
    }

    #[test]
    fn test_parse_socket_url_reject_garbage() {
        let err = "not a url".parse::<SocketUrl>().unwrap_err();
        assert!(matches!(err, ParseSocketUrlError::InvalidURL { .. }));
    }

    #[test]
    fn test_with_token_appends_query() {
        let u: SocketUrl = "wss://chat.example.com/prod".parse().unwrap();
        let full = u.with_token("abc+/=");
        assert_eq!(full.query(), Some("token=abc%2B%2F%3D"));
        // base url stays clean
        assert_eq!(u.as_url().query(), None);
    }

    #[test]
    fn test_decode_socket_connection() {
        let conn: SocketConnection = serde_json::from_str(
            r#"{"url": "wss://chat.example.com/prod", "connectionId": "c-1"}"#,
        )
        .unwrap();
        assert_eq!(conn.url, "wss://chat.example.com/prod");
        assert_eq!(conn.connection_id, "c-1");
    }
}
