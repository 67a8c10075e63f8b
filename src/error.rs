//! crate error types

use snafu::prelude::*;

use super::api::{types::ParseSocketUrlError, Error as APIError};

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Call chat api failed
    #[snafu(display("call chat api failed: {source}"))]
    CallAPIFailed {
        /// source error
        source: APIError,
    },

    /// Received invalid socket url address
    #[snafu(display("invalid socket url {url}"))]
    InvalidSocketURL {
        /// received url
        url: String,
        /// source error
        source: ParseSocketUrlError,
    },
}
