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
** Created on: 2026-10-02T15:21:47
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::ConfigError;

/// Configuration file format, guessed from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hcl,
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "hcl" => Some(Format::Hcl),
            "json" => Some(Format::Json),
            "yml" | "yaml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// A configuration source as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Dir(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::File(path) | ConfigSource::Dir(path) => path,
        }
    }

    /// Configuration files this source expands to, in merge order
    ///
    /// The filesystem decides between file and directory: a directory lists
    /// its `hcl`, `json` and `yaml` files sorted by name (sub-directories are
    /// not scanned), a file is parsed as HCL unless its extension says
    /// otherwise.
    pub fn files(&self) -> Result<Vec<(PathBuf, Format)>, ConfigError> {
        let path = self.path();
        let metadata = fs::metadata(path).map_err(|err| ConfigError::read(path, err))?;

        if !metadata.is_dir() {
            return Ok(vec![(
                path.to_path_buf(),
                Format::from_path(path).unwrap_or(Format::Hcl),
            )]);
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(path).map_err(|err| ConfigError::read(path, err))? {
            let entry = entry.map_err(|err| ConfigError::read(path, err))?;
            let file = entry.path();
            if file.is_dir() {
                continue;
            }
            match Format::from_path(&file) {
                Some(format) => files.push((file, format)),
                None => tracing::trace!(?file, "skipping non configuration file"),
            }
        }
        files.sort_by(|(lhs, _), (rhs, _)| lhs.file_name().cmp(&rhs.file_name()));
        Ok(files)
    }
}

/// Ordered configuration sources, later ones take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSourceList(Vec<ConfigSource>);

impl ConfigSourceList {
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigSource> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ConfigSource> for ConfigSourceList {
    fn from_iter<T: IntoIterator<Item = ConfigSource>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ConfigSourceList {
    type Item = &'a ConfigSource;
    type IntoIter = std::slice::Iter<'a, ConfigSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
