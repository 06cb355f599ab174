// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod cli;

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use datadog_build_reporter::logger::{env_filter, Formatter};
use datadog_build_reporter::metadata::EnvVars;
use datadog_build_reporter::{BuildNotification, BuildReporter, Config, DeliveryReport};

use cli::{Cli, Command};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::from_env();
    let log_level = match &config {
        Ok(c) => c.log_level.as_str(),
        Err(_) => DEFAULT_LOG_LEVEL,
    };
    init_logging(log_level);

    let config = match config {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error loading build reporter configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let reporter = BuildReporter::new(config);

    match cli.command {
        Command::Started(args) => {
            let run = args.into_run(now_millis(), EnvVars::from_process());
            let report = reporter.handle(BuildNotification::Started(&run)).await;
            summarize(&report);
            ExitCode::SUCCESS
        }
        Command::Completed(args) => {
            let run = args.into_run(now_millis(), EnvVars::from_process());
            let report = reporter.handle(BuildNotification::Completed(&run)).await;
            summarize(&report);
            ExitCode::SUCCESS
        }
        Command::Validate => match reporter.client().validate_api_key().await {
            Ok(true) => {
                info!("API key is valid");
                ExitCode::SUCCESS
            }
            Ok(false) => {
                error!("API key was rejected by Datadog");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("Unable to validate API key: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_logging(log_level: &str) {
    let filter = match env_filter(log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Could not parse log level '{log_level}': {e}");
            return;
        }
    };

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .event_format(Formatter)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
    }

    debug!("Logging subsystem enabled");
}

fn summarize(report: &DeliveryReport) {
    if report.is_empty() {
        return;
    }
    let failed = report.failures().count();
    if failed == 0 {
        info!("Delivered {} payload(s)", report.outcomes.len());
    } else {
        warn!(
            "{failed} of {} payload(s) could not be delivered",
            report.outcomes.len()
        );
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
