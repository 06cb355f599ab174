// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors raised while loading or validating the reporter configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DD_API_KEY is not set or empty")]
    MissingApiKey,

    #[error("Invalid hostname '{0}': it violates the format set in RFC 1123")]
    InvalidHostname(String),

    #[error("Invalid proxy hostname '{0}': it violates the format set in RFC 1123")]
    InvalidProxyHost(String),

    #[error("Invalid proxy port '{0}': a proxy port must be an integer value between 1 and 65535")]
    InvalidProxyPort(String),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Errors that end a single delivery to the Datadog API
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to prepare payload: {0}")]
    Payload(String),

    #[error("Hmmm, your API key may be invalid. We received a 403 error.")]
    Forbidden,

    #[error("{0}: unexpected response: {1}")]
    Status(StatusCode, String),

    #[error("API answered with status '{0}'")]
    Rejected(String),

    #[error("Unable to decode API response: {0}")]
    Decode(String),

    /// Holds the error without its request URL, which carries the API key. Build it with
    /// [`DeliveryError::transport`].
    #[error("Client error: {0}")]
    Transport(reqwest::Error),
}

impl DeliveryError {
    pub fn transport(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

/// The host could not supply the environment of a run
#[derive(Debug, thiserror::Error)]
#[error("Unable to read build environment: {0}")]
pub struct EnvironmentError(pub String);
