/*
** Copyright (C) 2025 Sylvain Fargier
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
** Created on: 2025-12-24T14:29:00
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{ffi::OsString, path::PathBuf};

use clap::{CommandFactory, Parser};

use crate::config::{ConfigSource, ConfigSourceList};

/// Flags taking a separate value argument
const VALUE_FLAGS: [&str; 2] = ["config-file", "config-dir"];

#[derive(Parser, Debug)]
#[command(
    name = "esm",
    version,
    about = "External Service Monitor",
    long_about = "External Service Monitor\n\n\
        A config file is optional, and can be either HCL, JSON or YAML format."
)]
pub struct Args {
    /// A config file to use. Can be either .hcl, .json or .yml format.
    /// Can be specified multiple times.
    #[arg(long = "config-file", value_name = "PATH")]
    pub config_file: Vec<PathBuf>,
    /// A directory to look for .hcl, .json or .yml config files in.
    /// Can be specified multiple times.
    #[arg(long = "config-dir", value_name = "PATH")]
    pub config_dir: Vec<PathBuf>,
}

impl Args {
    /// Parse the command line into the ordered configuration sources
    ///
    /// `-config-file` and `-config-dir` may be interleaved, the list keeps
    /// the command line order.
    pub fn parse_sources<I, T>(args: I) -> Result<ConfigSourceList, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = Args::command().try_get_matches_from(normalize(args))?;

        let kinds: [(&str, fn(PathBuf) -> ConfigSource); 2] = [
            ("config_file", ConfigSource::File),
            ("config_dir", ConfigSource::Dir),
        ];
        let mut sources: Vec<(usize, ConfigSource)> = Vec::new();
        for (id, kind) in kinds {
            if let (Some(values), Some(indices)) =
                (matches.get_many::<PathBuf>(id), matches.indices_of(id))
            {
                sources.extend(indices.zip(values.cloned().map(kind)));
            }
        }
        sources.sort_by_key(|(index, _)| *index);
        Ok(sources.into_iter().map(|(_, source)| source).collect())
    }
}

/// Accept single-dash long flags (`-config-file`) next to the `--` form
fn normalize<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut ret: Vec<OsString> = args.next().into_iter().collect();
    let mut is_value = false;

    while let Some(arg) = args.next() {
        let text = arg.to_str().map(str::to_owned);
        match text.as_deref() {
            Some("--") if !is_value => {
                ret.push(arg);
                ret.extend(args.by_ref());
                break;
            }
            Some(flag) if !is_value && flag.len() > 2 && flag.starts_with('-') => {
                let name = flag.trim_start_matches('-');
                is_value = VALUE_FLAGS.contains(&name);
                ret.push(OsString::from(format!("--{name}")));
            }
            _ => {
                is_value = false;
                ret.push(arg);
            }
        }
    }
    ret
}
