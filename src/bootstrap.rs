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
** Created on: 2026-10-07T10:26:15
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    ffi::OsString,
    fmt::Display,
    io::{self, Stderr, Stdout, Write},
};

use anyhow::Context;
use clap::error::ErrorKind;
use colored::Colorize;
use tracing_subscriber::fmt::MakeWriter;

use crate::{
    agent::Agent,
    cmdline::Args,
    config::{Config, ConfigError, merge},
    logging::{self, LogSetupError},
    shutdown::Shutdown,
    signals::SignalCoordinator,
    utils::{signal::Signal, tracing_utils::is_log_color},
};

/// Reasons for the process not to terminate normally
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    Usage(#[from] clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Log(#[from] LogSetupError),
    /// Agent construction or run failure, there is no degraded mode
    #[error("{0:#}")]
    Fatal(anyhow::Error),
}

impl Failure {
    /// Process exit status, `None` when the process must abort
    pub fn exit_code(&self) -> Option<u8> {
        match self {
            Failure::Usage(_) | Failure::Config(_) | Failure::Log(_) => Some(1),
            Failure::Fatal(_) => None,
        }
    }
}

/// Startup banner content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub datacenter: String,
    pub service: String,
    pub leader_key: String,
    pub node_reconnect_timeout: String,
}

impl From<&Config> for Banner {
    fn from(config: &Config) -> Self {
        Self {
            datacenter: config.datacenter_display(),
            service: format!("{:?}", config.service),
            leader_key: format!("{:?}", config.leader_key),
            node_reconnect_timeout: format!(
                "{:?}",
                humantime::format_duration(config.node_reconnect_timeout).to_string()
            ),
        }
    }
}

/// User facing outputs, bypassing the log sink
pub struct Terminal<O = fn() -> Stdout, E = fn() -> Stderr> {
    out: O,
    err: E,
    colored: bool,
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            out: std::io::stdout,
            err: std::io::stderr,
            colored: is_log_color(&std::io::stdout()),
        }
    }
}

impl<O, E> Terminal<O, E>
where
    O: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    E: for<'a> MakeWriter<'a>,
{
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            colored: false,
        }
    }

    fn output(&self, msg: &str) -> io::Result<()> {
        if self.colored {
            writeln!(self.out.make_writer(), "{}", msg.bold())
        } else {
            writeln!(self.out.make_writer(), "{}", msg)
        }
    }

    fn info(&self, msg: &str) -> io::Result<()> {
        self.out.make_writer().write_all(format!("{msg}\n").as_bytes())
    }

    fn error<T>(&self, msg: T)
    where
        T: Display,
    {
        let _ = self.err.make_writer().write_all(format!("{msg}\n").as_bytes());
    }

    pub fn banner(&self, banner: &Banner) -> io::Result<()> {
        self.output("Consul ESM running!")?;
        self.info(&format!("            Datacenter: {}", banner.datacenter))?;
        self.info(&format!("               Service: {}", banner.service))?;
        self.info(&format!("            Leader Key: {}", banner.leader_key))?;
        self.info(&format!("Node Reconnect Timeout: {}", banner.node_reconnect_timeout))?;
        self.info("")?;
        self.output("Log data will now stream in as it occurs:\n")
    }
}

/// Process startup sequence
///
/// Command line → configuration → logging → agent → signal handling →
/// banner → logs release → agent run.
pub struct Bootstrap<S, O = fn() -> Stdout, E = fn() -> Stderr> {
    signals: S,
    terminal: Terminal<O, E>,
}

impl<S, O, E> Bootstrap<S, O, E>
where
    S: IntoIterator<Item = Signal> + Send + 'static,
    O: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    E: for<'a> MakeWriter<'a>,
{
    /// `signals` is the process signal source, it is consumed by the
    /// [SignalCoordinator] once the agent is created
    pub fn new(signals: S, terminal: Terminal<O, E>) -> Self {
        Self { signals, terminal }
    }

    /// Run the process, returns once the agent has stopped
    pub fn run<A, I, T>(self, args: I) -> Result<(), Failure>
    where
        A: Agent,
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let terminal = self.terminal;
        let sources = match Args::parse_sources(args) {
            Ok(sources) => sources,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = write!(terminal.out.make_writer(), "{}", err.render());
                return Ok(());
            }
            Err(err) => {
                let _ = write!(terminal.err.make_writer(), "{}", err.render());
                return Err(err.into());
            }
        };

        let config =
            merge(Config::default(), &sources).inspect_err(|err| terminal.error(err))?;
        let logging = logging::setup(&config.log_config(), terminal.out.clone(), terminal.colored)
            .inspect_err(|err| terminal.error(err))?;
        let dispatch = logging.dispatch().clone();

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(sources = sources.len(), level = %logging.level(), "configuration loaded");
            for source in &sources {
                tracing::debug!(?source, "configuration source");
            }
            let banner = Banner::from(&config);

            let agent = match A::new(config, dispatch.clone()) {
                Ok(agent) => agent,
                Err(err) => {
                    // don't lose the diagnostics gathered so far
                    let _ = logging.gate().release();
                    return Err(Failure::Fatal(err.context("failed to create agent")));
                }
            };

            let shutdown = Shutdown::new();
            SignalCoordinator::new(shutdown.clone())
                .spawn(self.signals, dispatch.clone())
                .context("failed to start the signal handler")
                .map_err(Failure::Fatal)?;

            // losing the terminal does not prevent the agent from running
            if let Err(err) = terminal.banner(&banner) {
                terminal.error(format_args!("failed to print the banner: {err}"));
            }
            if let Err(err) = logging.gate().release() {
                terminal.error(format_args!("failed to release logs: {err}"));
            }

            agent
                .run(shutdown)
                .map_err(|err| Failure::Fatal(err.context("agent failure")))
        })
    }
}
