//! Credential source consulted on every connect attempt.

use std::{future::Future, sync::Arc};

use snafu::prelude::*;

/// Error when fetch credential
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum TokenError {
    /// no credential can be issued now, for example user not signed in
    #[snafu(display("credential unavailable: {reason}"))]
    Unavailable {
        /// reason for human read
        reason: String,
    },

    /// the credential backend failed
    #[snafu(display("credential backend failed: {source}"))]
    Backend {
        /// source error
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl TokenError {
    /// Create an [`Unavailable`](Self::Unavailable) error
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Wrap a backend error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Arc::new(err),
        }
    }
}

/// Supplies a short-lived bearer credential on demand.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    /// fetch a fresh credential
    async fn fetch(&self) -> Result<String, TokenError>;
}

#[async_trait::async_trait]
impl<F, Fut> TokenSource for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, TokenError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<String, TokenError> {
        self().await
    }
}

/// A credential that never changes.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn fetch(&self) -> Result<String, TokenError> {
        ensure!(
            !self.0.is_empty(),
            error::Unavailable {
                reason: "empty static token"
            }
        );
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken("secret".to_string());
        assert_eq!(source.fetch().await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn test_empty_static_token_is_unavailable() {
        let err = StaticToken(String::new()).fetch().await.unwrap_err();
        assert!(matches!(err, TokenError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_closure_token_source() {
        let source = || async { Err::<String, _>(TokenError::unavailable("signed out")) };
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.to_string(), "credential unavailable: signed out");
    }
}
