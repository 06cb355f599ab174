// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Build lifecycle reporting for the Datadog API.
//!
//! A host job-execution environment notifies the [`reporter::BuildReporter`] when a build
//! starts and when it completes. Each notification is turned into a
//! [`metadata::BuildRecord`], and from there into up to three payloads:
//!
//! - an event (`v1/events`) for both starts and completions,
//! - a `jenkins.job.duration` gauge (`v1/series`) for completions,
//! - a `jenkins.job.status` service check (`v1/check_run`) for completions.
//!
//! Every payload is delivered independently and best-effort: a failing delivery is logged
//! and reported back to the caller but never prevents its siblings from being sent.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod api_key;
pub mod client;
pub mod config;
pub mod error;
pub mod hostname;
pub mod logger;
pub mod metadata;
pub mod payload;
pub mod reporter;
pub mod tags;

pub use config::Config;
pub use reporter::{BuildNotification, BuildReporter, DeliveryReport};
