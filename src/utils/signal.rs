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
** Created on: 2026-10-02T10:14:51
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use anyhow::Result;
use std::{fmt::Debug, ops::Deref, ptr::null_mut};

use super::libc::check;

/// POSIX Signal wrapper
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal(pub libc::c_int);

pub const SIGHUP: Signal = Signal(libc::SIGHUP);
pub const SIGINT: Signal = Signal(libc::SIGINT);
pub const SIGQUIT: Signal = Signal(libc::SIGQUIT);
pub const SIGUSR1: Signal = Signal(libc::SIGUSR1);
pub const SIGUSR2: Signal = Signal(libc::SIGUSR2);
pub const SIGPIPE: Signal = Signal(libc::SIGPIPE);
pub const SIGALRM: Signal = Signal(libc::SIGALRM);
pub const SIGTERM: Signal = Signal(libc::SIGTERM);
pub const SIGCHLD: Signal = Signal(libc::SIGCHLD);
pub const SIGWINCH: Signal = Signal(libc::SIGWINCH);

/// Synchronous fault signals, these must keep their default disposition
const FAULT_SIGNALS: [libc::c_int; 6] = [
    libc::SIGSEGV,
    libc::SIGBUS,
    libc::SIGFPE,
    libc::SIGILL,
    libc::SIGTRAP,
    libc::SIGSYS,
];

impl Signal {
    pub fn kill(pid: libc::pid_t, signal: Signal) -> Result<()> {
        check(unsafe { libc::kill(pid, *signal) })
    }

    /// The process interrupt signal (`Ctrl-C`)
    pub fn is_interrupt(&self) -> bool {
        *self == SIGINT
    }
}

impl Deref for Signal {
    type Target = libc::c_int;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            libc::SIGHUP => f.write_str("SIGHUP"),
            libc::SIGINT => f.write_str("SIGINT"),
            libc::SIGQUIT => f.write_str("SIGQUIT"),
            libc::SIGUSR1 => f.write_str("SIGUSR1"),
            libc::SIGUSR2 => f.write_str("SIGUSR2"),
            libc::SIGPIPE => f.write_str("SIGPIPE"),
            libc::SIGALRM => f.write_str("SIGALRM"),
            libc::SIGTERM => f.write_str("SIGTERM"),
            libc::SIGCHLD => f.write_str("SIGCHLD"),
            libc::SIGWINCH => f.write_str("SIGWINCH"),
            sig => write!(f, "SIG({})", sig),
        }
    }
}

pub struct SignalSet(libc::sigset_t);

impl Debug for SignalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SignalSet")
            .field(&format_args!("{:X}", unsafe {
                *(&self.0 as *const _ as *const u32)
            }))
            .finish()
    }
}

impl SignalSet {
    /// Build an empty set
    pub fn empty() -> Result<Self> {
        let mut set: libc::sigset_t = unsafe { std::mem::zeroed() };
        check(unsafe { libc::sigemptyset(&mut set) })?;
        Ok(Self(set))
    }

    /// Every signal a process is allowed to catch
    ///
    /// `SIGKILL`, `SIGSTOP` and the synchronous fault signals are left out.
    pub fn catchable() -> Result<Self> {
        let mut set: libc::sigset_t = unsafe { std::mem::zeroed() };
        check(unsafe { libc::sigfillset(&mut set) })?;
        for sig in [libc::SIGKILL, libc::SIGSTOP].iter().chain(FAULT_SIGNALS.iter()) {
            check(unsafe { libc::sigdelset(&mut set, *sig) })?;
        }
        #[cfg(target_os = "macos")]
        check(unsafe { libc::sigdelset(&mut set, 32) })?;
        Ok(Self(set))
    }

    /// Add a signal in the set
    pub fn with(mut self, signal: Signal) -> Result<Self> {
        check(unsafe { libc::sigaddset(&mut self.0, *signal) })?;
        Ok(self)
    }

    pub fn contains(&self, signal: Signal) -> bool {
        unsafe { libc::sigismember(&self.0, *signal) == 1 }
    }

    /// Block signals in the set for the calling thread
    ///
    /// Threads spawned afterwards inherit the mask.
    #[tracing::instrument(level = "TRACE")]
    pub fn block(&self) -> Result<()> {
        check(unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &self.0, null_mut()) })
    }

    /// Unblock signals in the set
    #[tracing::instrument(level = "TRACE")]
    pub fn unblock(&self) -> Result<()> {
        check(unsafe { libc::pthread_sigmask(libc::SIG_UNBLOCK, &self.0, null_mut()) })
    }

    /// Wait for a (blocked) signal in the set to raise
    pub fn wait(&self) -> Result<Signal> {
        let mut sig: libc::c_int = 0;
        // sigwait returns the error number rather than setting errno
        match unsafe { libc::sigwait(&self.0, &mut sig) } {
            0 => Ok(Signal(sig)),
            err => Err(std::io::Error::from_raw_os_error(err).into()),
        }
    }

    /// Block the set and turn it into a stream of delivered signals
    pub fn subscribe(self) -> Result<Subscription> {
        self.block()?;
        Ok(Subscription(self))
    }
}

/// Blocking iterator over the signals delivered to the process
///
/// Every thread must have the set blocked (see [SignalSet::block]) for the
/// signals to be routed here, so subscribe before spawning any thread.
#[derive(Debug)]
pub struct Subscription(SignalSet);

impl Iterator for Subscription {
    type Item = Signal;

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .wait()
            .inspect_err(|err| tracing::error!(?err, "sigwait failed, closing signal channel"))
            .ok()
    }
}
