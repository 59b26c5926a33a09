// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic error types for configuration loading and validation.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error suitable for rich terminal rendering via miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Figment failed to parse or merge the configuration sources.
    #[error("failed to load configuration: {message}")]
    #[diagnostic(
        code(quill::config::parse),
        help("check quill.toml for typos; every key must match the documented schema")
    )]
    Parse { message: String },

    /// A value failed post-deserialization validation.
    #[error("{message}")]
    #[diagnostic(code(quill::config::validation))]
    Validation { message: String },
}

impl ConfigError {
    pub(crate) fn from_figment(err: figment::Error) -> Self {
        ConfigError::Parse {
            message: err.to_string(),
        }
    }
}
