// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP delivery to the Datadog API.
//!
//! Every call goes to `{api_url}{endpoint}?api_key={key}` through a single `reqwest` client,
//! optionally routed through an HTTP proxy. A call only succeeds when the API answers with a
//! JSON object whose `status` is `"ok"`. HTTP 403 is reported separately since it almost
//! always means the API key is wrong.

use crate::api_key::ApiKey;
use crate::config::Config;
use crate::error::DeliveryError;
use core::time::Duration;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tracing::{debug, error};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Datadog API endpoints used by the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Validate,
    Series,
    Events,
    CheckRun,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Validate => "v1/validate",
            Self::Series => "v1/series",
            Self::Events => "v1/events",
            Self::CheckRun => "v1/check_run",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    status: Option<String>,
}

#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
}

/// Builds a reqwest client with optional proxy configuration and timeout.
pub fn build_client(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// Creates the client described by `config`, falling back to a direct connection when the
/// proxy cannot be used.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    let proxy_url = config.proxy.url();
    match build_client(proxy_url.as_deref(), config.timeout) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            build_client(None, config.timeout).unwrap_or_else(|inner| {
                error!(
                    "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                    inner
                );
                reqwest::Client::new()
            })
        }
    }
}

/// Client of the Datadog API, authenticated with a static API key.
#[derive(Debug, Clone)]
pub struct DatadogClient {
    client: reqwest::Client,
    api_url: String,
    api_key: ApiKey,
}

impl DatadogClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: get_client(config),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.api_url, endpoint.path())
    }

    /// Posts `payload` as JSON to `endpoint`.
    ///
    /// Every failure is logged here with the endpoint it concerns before being returned.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        payload: &T,
    ) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(payload).map_err(|e| {
            error!("Failed to prepare payload for '{endpoint}'. Data dropped: {e}");
            DeliveryError::Payload(e.to_string())
        })?;

        match self.send(endpoint, body.clone()).await {
            Ok(()) => {
                debug!("API call of type '{endpoint}' was sent successfully!");
                debug!("Payload: {body}");
                Ok(())
            }
            Err(DeliveryError::Forbidden) => {
                error!("Hmmm, your API key may be invalid. We received a 403 error.");
                Err(DeliveryError::Forbidden)
            }
            Err(e) => {
                error!("API call of type '{endpoint}' failed: {e}");
                debug!("Payload: {body}");
                Err(e)
            }
        }
    }

    async fn send(&self, endpoint: Endpoint, body: String) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .query(&[("api_key", self.api_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .body(body)
            .send()
            .await
            .map_err(DeliveryError::transport)?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(DeliveryError::Forbidden);
        }
        let text = response.text().await.map_err(DeliveryError::transport)?;
        if !status.is_success() {
            return Err(DeliveryError::Status(status, text));
        }

        let parsed: StatusResponse =
            serde_json::from_str(&text).map_err(|e| DeliveryError::Decode(e.to_string()))?;
        match parsed.status.as_deref() {
            Some("ok") => Ok(()),
            Some(other) => Err(DeliveryError::Rejected(other.to_string())),
            None => Err(DeliveryError::Rejected("<missing>".to_string())),
        }
    }

    /// Asks the API whether the configured key is valid.
    pub async fn validate_api_key(&self) -> Result<bool, DeliveryError> {
        let response = self
            .client
            .get(self.url(Endpoint::Validate))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(DeliveryError::transport)?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(DeliveryError::Forbidden);
        }
        let text = response.text().await.map_err(DeliveryError::transport)?;
        if !status.is_success() {
            return Err(DeliveryError::Status(status, text));
        }

        let parsed: ValidateResponse =
            serde_json::from_str(&text).map_err(|e| DeliveryError::Decode(e.to_string()))?;
        Ok(parsed.valid)
    }
}
