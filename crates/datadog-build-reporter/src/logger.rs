// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line formatting for the build reporter.
//!
//! Every line is prefixed with `DD_BUILD_REPORTER` so it stands out in a build console:
//!
//! ```text
//! DD_BUILD_REPORTER | INFO | build_notification{job="build-x" number=42 phase=completion}: Sending event
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

pub const LOG_PREFIX: &str = "DD_BUILD_REPORTER";

/// Transport crates are too chatty below warn.
const QUIET_TARGETS: &str = "h2=off,hyper=off,hyper_util=off,rustls=off,reqwest=warn";

/// Event format used by the reporter binary.
///
/// Writes the `DD_BUILD_REPORTER` prefix and the level, then every span of the event scope
/// from the root down, with its recorded fields, then the event fields.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "{LOG_PREFIX} | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter for the given log level with the transport crates silenced.
pub fn env_filter(log_level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    EnvFilter::try_new(format!("{QUIET_TARGETS},{log_level}"))
}
