// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Command line definition.
//!
//! Job name and run number default to the `JOB_NAME` and `BUILD_NUMBER` variables the CI
//! server exports to every build step.

use clap::{Args, Parser, Subcommand};
use datadog_build_reporter::metadata::{EnvVars, RunInfo};

#[derive(Parser, Debug)]
#[command(name = "datadog-build-reporter")]
#[command(about = "Report build lifecycle notifications to Datadog", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report that a build started
    Started(RunArgs),

    /// Report the result of a finished build
    Completed(CompletedArgs),

    /// Check that the configured API key is accepted by Datadog
    Validate,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Display name of the job
    #[arg(long, env = "JOB_NAME")]
    pub job: String,

    /// Run number of the build
    #[arg(long, env = "BUILD_NUMBER")]
    pub number: u64,

    /// Start of the build in milliseconds since the unix epoch (defaults to now)
    #[arg(long)]
    pub start_time_ms: Option<i64>,
}

#[derive(Args, Debug)]
pub struct CompletedArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Terminal result, e.g. SUCCESS, FAILURE, UNSTABLE or ABORTED
    #[arg(long)]
    pub result: Option<String>,

    /// Duration of the build in milliseconds (defaults to the time elapsed since the start)
    #[arg(long)]
    pub duration_ms: Option<u64>,
}

impl RunArgs {
    pub fn into_run(self, now_ms: i64, environment: EnvVars) -> RunInfo {
        RunInfo {
            job_name: self.job,
            number: self.number,
            start_time_millis: self.start_time_ms.unwrap_or(now_ms),
            environment,
            ..RunInfo::default()
        }
    }
}

impl CompletedArgs {
    pub fn into_run(self, now_ms: i64, environment: EnvVars) -> RunInfo {
        let duration_ms = self.duration_ms;
        let result = self.result;
        let run = self.run.into_run(now_ms, environment);
        let duration_millis = duration_ms
            .unwrap_or_else(|| u64::try_from(now_ms - run.start_time_millis).unwrap_or(0));
        RunInfo {
            duration_millis,
            result,
            ..run
        }
    }
}
