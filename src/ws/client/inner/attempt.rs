use std::{sync::Arc, time::Duration};

use futures_util::{future::BoxFuture, FutureExt};
use snafu::prelude::*;
use tokio::time::Instant;

use crate::{
    token::{TokenError, TokenSource},
    ws::transport::{Connector, FrameSink, FrameStream, TransportError},
};

/// Error when a connect attempt does not reach connected state
///
/// When this is reported, the recovery path has already been taken.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ConnectError {
    /// token source failed
    #[snafu(display("fetch credential failed: {source}"))]
    FetchCredentialFailed {
        /// source error
        source: TokenError,
    },

    /// transport handshake failed
    #[snafu(display("open transport to {url} failed: {source}"))]
    OpenTransportFailed {
        /// socket base url, without credential
        url: String,
        /// source error
        #[snafu(source(from(TransportError, Arc::new)))]
        source: Arc<TransportError>,
    },

    /// credential fetch plus handshake exceed the connect timeout
    #[snafu(display("connect attempt timeout after {timeout:?}"))]
    Timeout {
        /// configured timeout
        timeout: Duration,
    },

    /// attempt aborted by disconnect
    #[snafu(display("connect attempt cancelled by disconnect"))]
    Cancelled,

    /// connection driver is gone
    #[snafu(display("connection manager stopped"))]
    ManagerStopped,
}

type Opened = (FrameSink, FrameStream);

enum Stage {
    FetchingToken(BoxFuture<'static, Result<String, TokenError>>),
    Opening(BoxFuture<'static, Result<Opened, TransportError>>),
}

pub(crate) enum Progress {
    Credential(Result<String, TokenError>),
    Opened(Result<Opened, TransportError>),
    TimedOut(Duration),
}

/// One in-flight connect attempt: fetch credential, then open transport.
pub(crate) struct Attempt {
    stage: Stage,
    timeout: Duration,
    deadline: Instant,
}

impl std::fmt::Debug for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self.stage {
            Stage::FetchingToken(_) => "FetchingToken",
            Stage::Opening(_) => "Opening",
        };
        f.debug_struct("Attempt")
            .field("stage", &stage)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Attempt {
    pub fn start<T: TokenSource>(tokens: Arc<T>, timeout: Duration) -> Self {
        log::debug!("Fetching credential ...");

        Self {
            stage: Stage::FetchingToken(async move { tokens.fetch().await }.boxed()),
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    /// Move to the opening stage, deadline is kept
    pub fn open<C: Connector>(&mut self, connector: Arc<C>, url: url::Url) {
        self.stage = Stage::Opening(async move { connector.connect(&url).await }.boxed());
    }

    /// Wait the current stage to complete, or the deadline
    pub async fn progress(&mut self) -> Progress {
        let timeout = self.timeout;
        let deadline = self.deadline;

        let stage = async {
            match &mut self.stage {
                Stage::FetchingToken(fut) => Progress::Credential(fut.await),
                Stage::Opening(fut) => Progress::Opened(fut.await),
            }
        };

        tokio::select! {
            progress = stage => progress,
            _ = tokio::time::sleep_until(deadline) => Progress::TimedOut(timeout),
        }
    }
}

/// Wait an optional attempt, pending forever when there is none.
pub(crate) async fn progress(attempt: &mut Option<Attempt>) -> Progress {
    match attempt {
        Some(a) => a.progress().await,
        None => futures_util::future::pending().await,
    }
}
