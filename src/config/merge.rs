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
** Created on: 2026-10-02T16:05:30
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use super::{Config, ConfigSourceList, Format};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Syntax errors, unknown keys and type mismatches
    #[error("error parsing {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parse<E>(path: &Path, err: E) -> Self
    where
        E: std::fmt::Display,
    {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Source the error originates from, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Content of a single configuration file
///
/// Every field is optional: only the ones present in the file override the
/// configuration it is applied on.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub log_level: Option<String>,
    pub enable_syslog: Option<bool>,
    pub syslog_facility: Option<String>,

    pub service: Option<String>,
    pub tag: Option<String>,
    pub leader_key: Option<String>,
    pub datacenter: Option<String>,
    pub node_meta: Option<BTreeMap<String, String>>,

    #[serde(with = "humantime_serde")]
    pub coordinate_update_interval: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub node_reconnect_timeout: Option<Duration>,

    pub http_addr: Option<String>,
    pub token: Option<String>,
    pub ca_file: Option<String>,
    pub ca_path: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub tls_server_name: Option<String>,
}

macro_rules! override_fields {
    ($partial:expr, $config:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $partial.$field {
                $config.$field = value;
            }
        )*
    };
}

impl PartialConfig {
    pub fn parse(content: &str, format: Format) -> Result<Self, String> {
        match format {
            Format::Hcl => hcl::from_str(content).map_err(|err| err.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|err| err.to_string()),
            // an empty yaml document is not an empty mapping
            Format::Yaml if content.trim().is_empty() => Ok(Self::default()),
            Format::Yaml => serde_yaml_ng::from_str(content).map_err(|err| err.to_string()),
        }
    }

    pub fn load(path: &Path, format: Format) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::read(path, err))?;
        Self::parse(&content, format).map_err(|err| ConfigError::parse(path, err))
    }

    /// Override `config` with the fields set in this source
    pub fn apply(self, config: &mut Config) {
        if let Some(node_meta) = self.node_meta {
            config.node_meta.extend(node_meta);
        }
        override_fields!(
            self,
            config,
            [
                log_level,
                enable_syslog,
                syslog_facility,
                service,
                tag,
                leader_key,
                datacenter,
                coordinate_update_interval,
                node_reconnect_timeout,
                http_addr,
                token,
                ca_file,
                ca_path,
                cert_file,
                key_file,
                tls_server_name,
            ]
        );
    }
}

/// Merge configuration `sources` on top of `base`
///
/// Sources are applied in order, directories being expanded in place.
/// Nothing is returned unless every source could be applied and the result
/// validated.
#[tracing::instrument(level = "DEBUG", skip(base))]
pub fn merge(base: Config, sources: &ConfigSourceList) -> Result<Config, ConfigError> {
    let mut config = base;
    for source in sources {
        for (path, format) in source.files()? {
            tracing::trace!(?path, ?format, "applying configuration file");
            PartialConfig::load(&path, format)?.apply(&mut config);
        }
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigSource, utils::MkTemp};
    use anyhow::Result;

    fn files<const N: usize>(paths: [&PathBuf; N]) -> ConfigSourceList {
        paths
            .into_iter()
            .map(|p| ConfigSource::File(p.clone()))
            .collect()
    }

    #[test]
    fn sparse_override() -> Result<()> {
        let dir = MkTemp::dir("merge-sparse")?;
        let a = dir.write("a.hcl", "service = \"x\"\n")?;
        let b = dir.write("b.hcl", "leader_key = \"y\"\n")?;

        let config = merge(Config::default(), &files([&a, &b]))?;
        assert_eq!("x", config.service);
        assert_eq!("y", config.leader_key);
        assert_eq!(Config::default().log_level, config.log_level);
        Ok(())
    }

    #[test]
    fn later_wins() -> Result<()> {
        let dir = MkTemp::dir("merge-order")?;
        let a = dir.write("a.hcl", "service = \"a\"\ndatacenter = \"dc1\"\n")?;
        let b = dir.write("b.json", r#"{ "service": "b" }"#)?;
        let c = dir.write("c.yml", "log_level: DEBUG\n")?;

        let config = merge(Config::default(), &files([&a, &b, &c]))?;
        assert_eq!("b", config.service);
        assert_eq!("dc1", config.datacenter);
        assert_eq!("DEBUG", config.log_level);

        let config = merge(Config::default(), &files([&b, &a]))?;
        assert_eq!("a", config.service);
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let dir = MkTemp::dir("merge-determinism")?;
        dir.write("conf.d/b.hcl", "service = \"b\"\n")?;
        dir.write("conf.d/a.hcl", "service = \"a\"\ntag = \"t\"\n")?;
        let sources = [ConfigSource::Dir(dir.path().join("conf.d"))]
            .into_iter()
            .collect();

        let first = merge(Config::default(), &sources)?;
        let second = merge(Config::default(), &sources)?;
        assert_eq!(first, second);
        assert_eq!("b", first.service);
        assert_eq!("t", first.tag);
        Ok(())
    }

    #[test]
    fn dir_then_file() -> Result<()> {
        let dir = MkTemp::dir("merge-dir-file")?;
        dir.write("conf.d/zz.hcl", "service = \"from-dir\"\n")?;
        let file = dir.write("aa.hcl", "service = \"from-file\"\n")?;

        let sources: ConfigSourceList = [
            ConfigSource::Dir(dir.path().join("conf.d")),
            ConfigSource::File(file),
        ]
        .into_iter()
        .collect();
        assert_eq!("from-file", merge(Config::default(), &sources)?.service);
        Ok(())
    }

    #[test]
    fn durations_and_meta() -> Result<()> {
        let dir = MkTemp::dir("merge-durations")?;
        let a = dir.write(
            "a.hcl",
            "node_reconnect_timeout = \"2h\"\nnode_meta = { \"rack\" = \"r1\" }\n",
        )?;
        let b = dir.write("b.json", r#"{ "coordinate_update_interval": "30s" }"#)?;

        let config = merge(Config::default(), &files([&a, &b]))?;
        assert_eq!(Duration::from_secs(7200), config.node_reconnect_timeout);
        assert_eq!(Duration::from_secs(30), config.coordinate_update_interval);
        assert_eq!(Some(&String::from("r1")), config.node_meta.get("rack"));
        assert_eq!(Some(&String::from("true")), config.node_meta.get("external-node"));
        Ok(())
    }

    #[test]
    fn errors() -> Result<()> {
        let dir = MkTemp::dir("merge-errors")?;
        let good = dir.write("good.hcl", "service = \"x\"\n")?;
        let unknown = dir.write("unknown.hcl", "no_such_key = 1\n")?;
        let mismatch = dir.write("mismatch.json", r#"{ "enable_syslog": "often" }"#)?;
        let broken = dir.write("broken.json", "{ service: ")?;

        for bad in [&unknown, &mismatch, &broken] {
            match merge(Config::default(), &files([&good, bad])) {
                Err(ConfigError::Parse { path, .. }) => assert_eq!(&path, bad),
                other => panic!("{bad:?}: unexpected result {other:?}"),
            }
        }

        let missing = dir.path().join("missing.hcl");
        let err = merge(Config::default(), &files([&good, &missing])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(Some(missing.as_path()), err.path());

        let empty = dir.write("empty.hcl", "service = \"\"\n")?;
        assert!(matches!(
            merge(Config::default(), &files([&empty])),
            Err(ConfigError::Invalid { field: "service", .. })
        ));
        Ok(())
    }

    #[test]
    fn empty_files() -> Result<()> {
        for (content, format) in [("", Format::Hcl), ("{}", Format::Json), ("", Format::Yaml)] {
            assert_eq!(PartialConfig::default(), PartialConfig::parse(content, format).unwrap());
        }
        Ok(())
    }
}
