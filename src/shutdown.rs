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
** Created on: 2026-10-04T17:22:10
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    fmt::Debug,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShutdownError {
    #[error("shutdown already requested")]
    AlreadyFired,
}

#[derive(Default)]
struct Inner {
    fired: Mutex<bool>,
    cond: Condvar,
}

/// One-shot shutdown notification
///
/// Pending until [Shutdown::fire] is called, which may happen once only.
/// Clones share the same notification.
#[derive(Clone, Default)]
pub struct Shutdown(Arc<Inner>);

impl Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Shutdown").field(&self.is_fired()).finish()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire the notification, waking up waiters
    pub fn fire(&self) -> Result<(), ShutdownError> {
        let mut fired = self.lock();
        if *fired {
            return Err(ShutdownError::AlreadyFired);
        }
        *fired = true;
        self.0.cond.notify_all();
        Ok(())
    }

    pub fn is_fired(&self) -> bool {
        *self.lock()
    }

    /// Block until the notification fires
    pub fn wait(&self) {
        let _fired = self
            .0
            .cond
            .wait_while(self.lock(), |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until the notification fires or `timeout` expires
    ///
    /// Returns `true` when fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (fired, _) = self
            .0
            .cond
            .wait_timeout_while(self.lock(), timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }
}
