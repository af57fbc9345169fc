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
    io::{self, Write},
    sync::{Arc, Mutex},
};

use tracing_subscriber::fmt::MakeWriter;

#[tracing::instrument(level = "DEBUG", name = "wait_for", skip(fun))]
pub(crate) fn _wait_for<F, K>(mut fun: F, expiry: std::time::Duration) -> anyhow::Result<K>
where
    F: FnMut() -> anyhow::Result<K>,
    K: std::fmt::Debug,
{
    let start = std::time::Instant::now();
    while start.elapsed() <= expiry {
        if let Ok(ret) = fun() {
            return Ok(ret);
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    fun().inspect_err(|err| tracing::trace!(?err, "test failed"))
}

/// Test macro to poll a condition until it validates
///
/// It'll return the last error on expiry (default timeout: 5 seconds,
/// polling interval: 10ms).
macro_rules! wait_for {
    ($cond:expr $(,)?) => { $crate::utils::test_utils::_wait_for(|| {
        anyhow::ensure!($cond);
        return Ok(());
    }, std::time::Duration::from_secs(5)) };
    ($cond:expr, $msg:literal $(, $arg:expr)* $(,)?) => { $crate::utils::test_utils::_wait_for(|| {
        anyhow::ensure!($cond, $msg $(, $arg)*);
        return Ok(());
    }, std::time::Duration::from_secs(5)) };
}
pub(crate) use wait_for;

/// Cloneable in-memory writer, clones share the same buffer
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn content(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
