// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reacts to build lifecycle notifications.
//!
//! A start notification sends a single event. A completion sends the result event, the
//! duration gauge and the status service check, each delivered on its own: one failing
//! payload never keeps the others from being sent.

use crate::client::{DatadogClient, Endpoint};
use crate::config::Config;
use crate::error::DeliveryError;
use crate::hostname::{System, SystemHostname};
use crate::metadata::{collect, BuildRun, Phase};
use crate::payload::{build_duration_gauge, build_event, build_status_check};
use crate::tags;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, info_span, warn, Instrument};

/// A lifecycle notification from the host job-execution environment.
#[derive(Clone, Copy)]
pub enum BuildNotification<'a> {
    Started(&'a dyn BuildRun),
    Completed(&'a dyn BuildRun),
}

impl<'a> BuildNotification<'a> {
    pub fn run(&self) -> &'a dyn BuildRun {
        match self {
            Self::Started(run) | Self::Completed(run) => *run,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Started(_) => Phase::Start,
            Self::Completed(_) => Phase::Completion,
        }
    }
}

/// Outcome of every delivery attempted for one notification, in the order they were sent.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<(Endpoint, Result<(), DeliveryError>)>,
}

impl DeliveryReport {
    /// True when nothing was sent, e.g. for a blacklisted job.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn attempted(&self, endpoint: Endpoint) -> bool {
        self.outcomes.iter().any(|(e, _)| *e == endpoint)
    }

    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|(_, result)| result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Endpoint, &DeliveryError)> {
        self.outcomes
            .iter()
            .filter_map(|(endpoint, result)| result.as_ref().err().map(|e| (*endpoint, e)))
    }

    fn record(&mut self, endpoint: Endpoint, result: Result<(), DeliveryError>) {
        self.outcomes.push((endpoint, result));
    }
}

pub struct BuildReporter {
    config: Arc<Config>,
    client: DatadogClient,
    system: Arc<dyn SystemHostname>,
}

impl BuildReporter {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_system(config, Arc::new(System))
    }

    /// Reporter resolving hostnames against `system` instead of the local machine.
    pub fn with_system(config: Arc<Config>, system: Arc<dyn SystemHostname>) -> Self {
        let client = DatadogClient::new(&config);
        Self {
            config,
            client,
            system,
        }
    }

    pub fn client(&self) -> &DatadogClient {
        &self.client
    }

    /// Handles one notification. Never fails: every delivery error has already been logged
    /// and is returned in the report.
    pub async fn handle(&self, notification: BuildNotification<'_>) -> DeliveryReport {
        let run = notification.run();
        let phase = notification.phase();
        let job = run.job_name();

        if self.config.blacklist.contains(job) {
            info!("Job '{job}' is blacklisted, skipping {phase} notification");
            return DeliveryReport::default();
        }

        let span = info_span!(
            "build_notification",
            job = job,
            number = run.number(),
            phase = %phase
        );
        self.report(run, phase).instrument(span).await
    }

    async fn report(&self, run: &dyn BuildRun, phase: Phase) -> DeliveryReport {
        match phase {
            Phase::Start => info!("Started build"),
            Phase::Completion => info!("Completed build"),
        }

        let record = collect(
            run,
            phase,
            self.config.hostname.as_deref(),
            self.system.as_ref(),
        );
        let tags = tags::assemble(&record, self.config.tag_node);
        debug!("Collected {record:?} with tags {tags:?}");

        let mut report = DeliveryReport::default();

        let event = build_event(&record, tags.clone());
        report.record(
            Endpoint::Events,
            self.client.post(Endpoint::Events, &event).await,
        );

        if phase == Phase::Start {
            return report;
        }

        let now = now_secs();
        match build_duration_gauge(&record, tags.clone(), now) {
            Some(series) => report.record(
                Endpoint::Series,
                self.client.post(Endpoint::Series, &series).await,
            ),
            None => warn!("Build has no duration, not sending the duration gauge"),
        }

        let check = build_status_check(&record, tags, now);
        report.record(
            Endpoint::CheckRun,
            self.client.post(Endpoint::CheckRun, &check).await,
        );

        report
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
