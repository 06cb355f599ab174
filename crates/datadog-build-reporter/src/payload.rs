// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Datadog API payloads built from a [`BuildRecord`].
//!
//! Builders are pure: the current time is passed in by the caller. Field names of the
//! serialized structs are the wire contract of the `v1/events`, `v1/series` and
//! `v1/check_run` endpoints.

use crate::metadata::BuildRecord;
use serde::{Serialize, Serializer};

pub const DURATION_METRIC: &str = "jenkins.job.duration";
pub const STATUS_CHECK: &str = "jenkins.job.status";
/// Marks result events as coming from Jenkins. Start events go without it so that they are
/// not rolled up together with results.
pub const SOURCE_TYPE_NAME: &str = "jenkins";

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Success,
    Failure,
    Info,
}

/// Body of `POST v1/events`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub title: String,
    pub text: String,
    pub date_happened: i64,
    pub event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub result: Option<String>,
    pub tags: Vec<String>,
    pub aggregation_key: String,
    pub alert_type: AlertType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type_name: Option<&'static str>,
}

/// Body of `POST v1/series`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub series: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub metric: &'static str,
    /// `[unix seconds, value]` pairs
    pub points: Vec<(i64, f64)>,
    #[serde(rename = "type")]
    pub metric_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCheckStatus {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl Serialize for ServiceCheckStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Body of `POST v1/check_run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCheck {
    pub check: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    pub timestamp: i64,
    pub status: ServiceCheckStatus,
    pub tags: Vec<String>,
}

/// Renders a duration in seconds as `(<n> secs)`, `(<n> mins)` or `(<n> hrs)`.
///
/// The value is not rounded: `125.0` renders as `(2.0833333333333335 mins)`.
pub fn duration_to_string(duration_secs: f64) -> String {
    if duration_secs < MINUTE {
        format!("({duration_secs:?} secs)")
    } else if duration_secs < HOUR {
        format!("({:?} mins)", duration_secs / MINUTE)
    } else {
        format!("({:?} hrs)", duration_secs / HOUR)
    }
}

pub fn build_event(record: &BuildRecord, tags: Vec<String>) -> Event {
    let number = record.number;
    let (verb, alert_type, link_label, source_type_name) = match &record.result {
        Some(result) if result.is_success() => (
            "succeeded",
            AlertType::Success,
            format!("See results for build #{number}"),
            Some(SOURCE_TYPE_NAME),
        ),
        Some(_) => (
            "failed",
            AlertType::Failure,
            format!("See results for build #{number}"),
            Some(SOURCE_TYPE_NAME),
        ),
        None => (
            "started",
            AlertType::Info,
            format!("Follow build #{number} progress"),
            None,
        ),
    };

    let mut title = format!("{} build #{number} {verb}", record.job);
    if let Some(hostname) = &record.hostname {
        title.push_str(&format!(" on {hostname}"));
    }

    let link = match &record.build_url {
        Some(url) => format!("[{link_label}]({url})"),
        None => link_label,
    };
    let mut text = format!("%%% \n {link} ");
    if let Some(duration) = record.duration_secs {
        text.push_str(&duration_to_string(duration));
    }
    text.push_str(" \n %%%");

    Event {
        title,
        text,
        date_happened: record.timestamp(),
        event_type: record.event_type.as_str(),
        host: record.hostname.clone(),
        result: record.result.as_ref().map(|r| r.to_string()),
        tags,
        aggregation_key: record.job.clone(),
        alert_type,
        source_type_name,
    }
}

/// Gauge of the build duration. `None` when the record has no duration.
pub fn build_duration_gauge(
    record: &BuildRecord,
    tags: Vec<String>,
    now_secs: i64,
) -> Option<Series> {
    let duration = record.duration_secs?;
    Some(Series {
        series: vec![Metric {
            metric: DURATION_METRIC,
            points: vec![(now_secs, duration)],
            metric_type: "gauge",
            host: record.hostname.clone(),
            tags,
        }],
    })
}

/// OK for a successful build, CRITICAL for anything else.
pub fn build_status_check(
    record: &BuildRecord,
    tags: Vec<String>,
    now_secs: i64,
) -> ServiceCheck {
    let status = match &record.result {
        Some(result) if result.is_success() => ServiceCheckStatus::Ok,
        _ => ServiceCheckStatus::Critical,
    };
    ServiceCheck {
        check: STATUS_CHECK,
        host_name: record.hostname.clone(),
        timestamp: now_secs,
        status,
        tags,
    }
}
