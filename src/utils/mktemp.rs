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
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    env::temp_dir,
    fs::{create_dir, create_dir_all},
    io::{ErrorKind, Result},
    path::{Path, PathBuf},
};

/// Convenience empty struct
///
/// See [MkTemp::dir]
pub struct MkTemp();

/// A temporary directory, removed with its content on drop
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl TempDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `content` in `name`, relative to the directory
    ///
    /// Intermediate directories are created as needed.
    pub fn write<C>(&self, name: &str, content: C) -> Result<PathBuf>
    where
        C: AsRef<[u8]>,
    {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(?err, path = ?self.path, "failed to remove temporary dir");
        }
    }
}

impl MkTemp {
    /// Create a temporary directory
    ///
    /// The temporary directory is deleted when object is dropped
    pub fn dir(prefix: &str) -> Result<TempDir> {
        let temp_dir = temp_dir();
        let pid = std::process::id();
        let mut suffix = 0;
        loop {
            let path = temp_dir.join(format!("{prefix}-{pid}-{suffix}"));
            match create_dir(&path) {
                Ok(_) => return Ok(TempDir { path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir() -> Result<()> {
        let path: PathBuf = {
            let dir = MkTemp::dir("test")?;
            let file = dir.write("sub/file.hcl", "service = \"x\"")?;

            assert!(dir.path().is_dir());
            assert_eq!(std::fs::read_to_string(file)?, "service = \"x\"");
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
        Ok(())
    }
}
