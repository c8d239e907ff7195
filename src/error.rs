// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for metadata extraction.
//!
//! Every failure carries an [`ErrorKind`] so callers can decide on retry
//! policy without inspecting message text. Errors are built through
//! [`CatalogErrorHelper`]:
//!
//! ```ignore
//! return Err(CatalogErrorHelper::malformed_protocol()
//!     .message(format!("partition spec segment '{}' has no '='", segment)));
//! ```

use std::fmt;

/// Classification of a metadata extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The table does not exist, or its describe result has no rows.
    NotFound,
    /// The query executor failed: connection loss, timeout, cancellation,
    /// rejected SQL, undecodable response.
    BackendUnavailable,
    /// Section markers or sentinels are missing or out of order.
    MalformedProtocol,
    /// A field was requested past the end of a row.
    MalformedRow,
    /// A caller-supplied value (table name, option) was rejected.
    InvalidArgument,
    /// An operation was called in a state that does not allow it.
    InvalidState,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::BackendUnavailable => "backend unavailable",
            ErrorKind::MalformedProtocol => "malformed protocol",
            ErrorKind::MalformedRow => "malformed row",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidState => "invalid state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Create an error of the given kind with an empty message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
        }
    }

    /// Attach a human-readable message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Prefix the existing message with additional context.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = if self.message.is_empty() {
            context.to_string()
        } else {
            format!("{}: {}", context, self.message)
        };
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message_text(&self) -> &str {
        &self.message
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Constructors for each [`ErrorKind`].
pub struct CatalogErrorHelper;

impl CatalogErrorHelper {
    pub fn not_found() -> Error {
        Error::new(ErrorKind::NotFound)
    }

    /// Executor and transport failures.
    pub fn io() -> Error {
        Error::new(ErrorKind::BackendUnavailable)
    }

    pub fn malformed_protocol() -> Error {
        Error::new(ErrorKind::MalformedProtocol)
    }

    pub fn malformed_row() -> Error {
        Error::new(ErrorKind::MalformedRow)
    }

    pub fn invalid_argument() -> Error {
        Error::new(ErrorKind::InvalidArgument)
    }

    pub fn invalid_state() -> Error {
        Error::new(ErrorKind::InvalidState)
    }

    /// Error for an option key this crate does not recognize.
    pub fn set_unknown_option(key: &str) -> Error {
        Self::invalid_argument().message(format!("unknown option '{}'", key))
    }

    /// Error for a recognized option whose value could not be parsed.
    pub fn set_invalid_option(key: &str, value: &str) -> Error {
        Self::invalid_argument().message(format!("invalid value '{}' for option '{}'", value, key))
    }
}
