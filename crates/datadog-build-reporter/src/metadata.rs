// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Build metadata collection.
//!
//! The host supplies a [`BuildRun`]; [`collect`] flattens it into a [`BuildRecord`] at one of
//! two points of the build lifecycle. Missing environment data is never fatal: the record is
//! built with whatever fields are still available.

use crate::error::EnvironmentError;
use crate::hostname::{resolve_hostname, SystemHostname};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

pub const ENV_HOSTNAME: &str = "HOSTNAME";
pub const ENV_BUILD_URL: &str = "BUILD_URL";
pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_GIT_BRANCH: &str = "GIT_BRANCH";
pub const ENV_CVS_BRANCH: &str = "CVS_BRANCH";

const SUCCESS: &str = "SUCCESS";
const FAILURE: &str = "FAILURE";

/// Environment variables of a single run.
///
/// Variables set to an empty string are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars(HashMap<String, String>);

impl EnvVars {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// `GIT_BRANCH`, falling back to `CVS_BRANCH`.
    pub fn branch(&self) -> Option<&str> {
        self.get(ENV_GIT_BRANCH).or_else(|| self.get(ENV_CVS_BRANCH))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A single execution of a job, as seen from the host job-execution environment.
pub trait BuildRun: Send + Sync {
    /// Display name of the job.
    fn job_name(&self) -> &str;

    /// Sequence number of this run.
    fn number(&self) -> u64;

    /// Start of the run, in milliseconds since the unix epoch.
    fn start_time_millis(&self) -> i64;

    /// Duration of the run in milliseconds. Only meaningful once the run completed.
    fn duration_millis(&self) -> u64;

    /// Terminal result token such as `SUCCESS` or `FAILURE`. `None` while running.
    fn result(&self) -> Option<&str>;

    fn environment(&self) -> Result<EnvVars, EnvironmentError>;
}

/// Plain [`BuildRun`] holding every fact up front.
#[derive(Debug, Clone, Default)]
pub struct RunInfo {
    pub job_name: String,
    pub number: u64,
    pub start_time_millis: i64,
    pub duration_millis: u64,
    pub result: Option<String>,
    pub environment: EnvVars,
}

impl BuildRun for RunInfo {
    fn job_name(&self) -> &str {
        &self.job_name
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn start_time_millis(&self) -> i64 {
        self.start_time_millis
    }

    fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    fn environment(&self) -> Result<EnvVars, EnvironmentError> {
        Ok(self.environment.clone())
    }
}

/// Terminal result of a run.
///
/// Only `SUCCESS` counts as success. `FAILURE` and every other token (`UNSTABLE`,
/// `ABORTED`, ...) are reported as failures, but the raw token is kept for event text and
/// tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    Failure,
    Other(String),
}

impl BuildResult {
    pub fn from_token(token: &str) -> Self {
        match token {
            SUCCESS => Self::Success,
            FAILURE => Self::Failure,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => SUCCESS,
            Self::Failure => FAILURE,
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose of a record, used by Datadog to roll events up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    BuildStart,
    BuildResult,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildStart => "build start",
            Self::BuildResult => "build result",
        }
    }
}

/// Point of the lifecycle a record is collected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Completion,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Completion => f.write_str("completion"),
        }
    }
}

/// Normalized snapshot of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecord {
    pub hostname: Option<String>,
    pub job: String,
    pub number: u64,
    /// `None` while the build is in progress
    pub result: Option<BuildResult>,
    pub start_time_secs: i64,
    /// `None` while the build is in progress
    pub duration_secs: Option<f64>,
    pub end_time_secs: Option<i64>,
    pub build_url: Option<String>,
    pub node: Option<String>,
    pub branch: Option<String>,
    pub event_type: EventType,
}

impl BuildRecord {
    /// When the recorded event happened: the end of the build once it completed, its start
    /// otherwise.
    pub fn timestamp(&self) -> i64 {
        self.end_time_secs.unwrap_or(self.start_time_secs)
    }
}

/// Builds the record of `run` for the given lifecycle `phase`.
pub fn collect(
    run: &dyn BuildRun,
    phase: Phase,
    configured_hostname: Option<&str>,
    system: &dyn SystemHostname,
) -> BuildRecord {
    let env = match run.environment() {
        Ok(env) => env,
        Err(e) => {
            error!("{e}, continuing without environment data");
            EnvVars::default()
        }
    };

    let hostname = resolve_hostname(configured_hostname, env.get(ENV_HOSTNAME), system);
    let start_time_secs = run.start_time_millis().div_euclid(1000);
    let build_url = env.get(ENV_BUILD_URL).map(str::to_string);

    match phase {
        Phase::Start => BuildRecord {
            hostname,
            job: run.job_name().to_string(),
            number: run.number(),
            result: None,
            start_time_secs,
            duration_secs: None,
            end_time_secs: None,
            build_url,
            node: None,
            branch: None,
            event_type: EventType::BuildStart,
        },
        Phase::Completion => {
            let duration_secs = run.duration_millis() as f64 / 1000.0;
            let result = match run.result() {
                Some(token) => BuildResult::from_token(token),
                None => {
                    warn!("Completed build has no result, reporting it as UNKNOWN");
                    BuildResult::Other("UNKNOWN".to_string())
                }
            };
            BuildRecord {
                hostname,
                job: run.job_name().to_string(),
                number: run.number(),
                result: Some(result),
                start_time_secs,
                duration_secs: Some(duration_secs),
                end_time_secs: Some(start_time_secs + duration_secs.floor() as i64),
                build_url,
                node: env.get(ENV_NODE_NAME).map(str::to_string),
                branch: env.branch().map(str::to_string),
                event_type: EventType::BuildResult,
            }
        }
    }
}
