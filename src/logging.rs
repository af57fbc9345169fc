/*
** Copyright (C) 2026 Sylvain Fargier
**
** This software is provided 'as-is', without any express or implied
** warranty.  In no event will the authors be held liable for any damages
** arising from the use of this software.
**
** Permission is granted to anyone to use this software for any purpose,
** including commercial applications, and to alter it and redistribute it
** freely, subject to the following restrictions:
**
** 1. The origin of this software must not be misrepresented; you must not
**    claim that you wrote the original software. If you use this software
**    in a product, an acknowledgment in the product documentation would be
**    appreciated but is not required.
** 2. Altered source versions must be plainly marked as such, and must not be
**    misrepresented as being the original software.
** 3. This notice may not be removed or altered from any source distribution.
**
** Created on: 2026-10-03T08:50:26
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{fmt::Display, str::FromStr};

use tracing::{Dispatch, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, Registry, fmt::MakeWriter, layer::SubscriberExt};

use crate::utils::tracing_utils::fmt_layer;

mod gate;
pub use gate::GatedWriter;

mod syslog;
pub use syslog::{Facility, Syslog, SyslogLayer};

/// Environment variable overriding the configured log directives
pub const LOG_ENV: &str = "ESM_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LogSetupError {
    #[error("invalid log level: {0:?}, valid log levels are: TRACE, DEBUG, INFO, WARN, ERR")]
    Level(String),
    #[error("invalid syslog facility: {0:?}")]
    Facility(String),
    #[error("syslog setup failed: {0}")]
    Syslog(#[source] std::io::Error),
}

/// Logging related configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub enable_syslog: bool,
    pub syslog_facility: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = LogSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERR" | "ERROR" => Ok(LogLevel::Error),
            _ => Err(LogSetupError::Level(s.to_string())),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERR",
        })
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Log sink built from a [LogConfig]
///
/// The sink is not installed globally, scope it with
/// [tracing::dispatcher::with_default] where needed.
#[derive(Debug)]
pub struct Logging {
    level: LogLevel,
    dispatch: Dispatch,
    gate: GatedWriter,
}

impl Logging {
    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Writer holding formatted logs back until released
    pub fn gate(&self) -> &GatedWriter {
        &self.gate
    }
}

/// Build the log sink
///
/// Formatted logs go to `output` through a [GatedWriter], and to syslog when
/// enabled (syslog is not gated).
pub fn setup<W>(config: &LogConfig, output: W, ansi: bool) -> Result<Logging, LogSetupError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let level: LogLevel = config.level.parse()?;

    let syslog = if config.enable_syslog {
        let facility: Facility = config.syslog_facility.parse()?;
        Some(SyslogLayer::new(
            Syslog::connect(facility).map_err(LogSetupError::Syslog)?,
        ))
    } else {
        None
    };

    let gate = GatedWriter::new(output);
    let subscriber = Registry::default()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(level).into())
                .with_env_var(LOG_ENV)
                .from_env_lossy(),
        )
        .with(fmt_layer(gate.clone(), ansi))
        .with(syslog);

    Ok(Logging {
        level,
        dispatch: Dispatch::new(subscriber),
        gate,
    })
}
