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
** Created on: 2026-10-06T13:08:57
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use anyhow::{Result, ensure};
use tracing::Dispatch;

use crate::{config::Config, shutdown::Shutdown};

/// Monitoring agent started by the bootstrap
pub trait Agent: Sized {
    /// Build the agent, `logger` being the process log sink
    fn new(config: Config, logger: Dispatch) -> Result<Self>;

    /// Run until `shutdown` fires or an unrecoverable error occurs
    fn run(&self, shutdown: Shutdown) -> Result<()>;
}

/// External service monitor
///
/// Registers as `config.service` and refreshes its node coordinates every
/// `coordinate_update_interval` until shutdown.
#[derive(Debug)]
pub struct Esm {
    config: Config,
    logger: Dispatch,
}

impl Esm {
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[tracing::instrument(level = "TRACE", skip(self))]
    fn update_coordinates(&self) {
        tracing::trace!(nodes = ?self.config.node_meta, "refreshing coordinates");
    }
}

impl Agent for Esm {
    fn new(config: Config, logger: Dispatch) -> Result<Self> {
        config.validate()?;
        ensure!(
            !config.http_addr.contains(char::is_whitespace),
            "invalid http_addr: {:?}",
            config.http_addr
        );
        tracing::dispatcher::with_default(&logger, || {
            tracing::debug!(
                service = %config.service,
                tag = %config.tag,
                leader_key = %config.leader_key,
                "agent created"
            )
        });
        Ok(Self { config, logger })
    }

    fn run(&self, shutdown: Shutdown) -> Result<()> {
        tracing::dispatcher::with_default(&self.logger, || {
            let _span = tracing::info_span!("agent", service = %self.config.service).entered();
            tracing::info!("agent running");

            while !shutdown.wait_timeout(self.config.coordinate_update_interval) {
                self.update_coordinates();
            }
            tracing::info!("shutdown complete");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn invalid_config() {
        let config = Config {
            leader_key: String::new(),
            ..Default::default()
        };
        assert!(Esm::new(config, Dispatch::none()).is_err());

        let config = Config {
            http_addr: String::from("local host:8500"),
            ..Default::default()
        };
        assert!(Esm::new(config, Dispatch::none()).is_err());
    }

    #[test]
    fn run_until_shutdown() -> Result<()> {
        let config = Config {
            coordinate_update_interval: Duration::from_millis(5),
            ..Default::default()
        };
        let agent = Esm::new(config, Dispatch::none())?;
        assert_eq!("consul-esm", agent.config().service);

        let shutdown = Shutdown::new();
        let handle = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || agent.run(shutdown))
        };
        std::thread::sleep(Duration::from_millis(30));
        assert!(!handle.is_finished());

        shutdown.fire()?;
        handle.join().unwrap()
    }
}
