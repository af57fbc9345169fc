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
** Created on: 2026-10-02T14:40:03
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use serde::Serialize;
use std::{collections::BTreeMap, time::Duration};

use crate::logging::LogConfig;

mod merge;
pub use merge::{ConfigError, PartialConfig, merge};

mod source;
pub use source::{ConfigSource, ConfigSourceList, Format};

pub const DEFAULT_SERVICE: &str = "consul-esm";
pub const DEFAULT_LEADER_KEY: &str = "consul-esm/lock";

/// Effective configuration of the monitor
///
/// Built from [Config::default] then [merge]d with the configuration sources,
/// it is not modified anymore once handed to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub log_level: String,
    pub enable_syslog: bool,
    pub syslog_facility: String,

    pub service: String,
    pub tag: String,
    pub leader_key: String,
    /// empty for the agent's default datacenter
    pub datacenter: String,
    pub node_meta: BTreeMap<String, String>,

    #[serde(with = "humantime_serde")]
    pub coordinate_update_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub node_reconnect_timeout: Duration,

    pub http_addr: String,
    pub token: String,
    pub ca_file: String,
    pub ca_path: String,
    pub cert_file: String,
    pub key_file: String,
    pub tls_server_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: String::from("INFO"),
            enable_syslog: false,
            syslog_facility: String::from("LOCAL0"),
            service: String::from(DEFAULT_SERVICE),
            tag: String::new(),
            leader_key: String::from(DEFAULT_LEADER_KEY),
            datacenter: String::new(),
            node_meta: BTreeMap::from([(String::from("external-node"), String::from("true"))]),
            coordinate_update_interval: Duration::from_secs(10),
            node_reconnect_timeout: Duration::from_secs(72 * 3600),
            http_addr: String::new(),
            token: String::new(),
            ca_file: String::new(),
            ca_path: String::new(),
            cert_file: String::new(),
            key_file: String::new(),
            tls_server_name: String::new(),
        }
    }
}

impl Config {
    /// Logging related part of the configuration
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            enable_syslog: self.enable_syslog,
            syslog_facility: self.syslog_facility.clone(),
        }
    }

    /// Semantic checks, run once all the sources are merged
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.service.is_empty() {
            return invalid("service", "must not be empty");
        }
        if self.leader_key.is_empty() {
            return invalid("leader_key", "must not be empty");
        }
        if self.coordinate_update_interval.is_zero() {
            return invalid("coordinate_update_interval", "must be greater than zero");
        }
        if self.node_reconnect_timeout.is_zero() {
            return invalid("node_reconnect_timeout", "must be greater than zero");
        }
        Ok(())
    }

    /// Datacenter as displayed to the user
    pub fn datacenter_display(&self) -> String {
        if self.datacenter.is_empty() {
            String::from("(default)")
        } else {
            format!("{:?}", self.datacenter)
        }
    }
}
