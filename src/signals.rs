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
** Created on: 2026-10-05T09:41:33
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::thread::JoinHandle;

use tracing::Dispatch;

use crate::{
    shutdown::{Shutdown, ShutdownError},
    utils::signal::Signal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Armed,
    /// terminal
    ShuttingDown,
}

/// Turns the process signals into a single shutdown request
///
/// Only the interrupt signal is acted upon, and only the first one.
#[derive(Debug)]
pub struct SignalCoordinator {
    state: State,
    shutdown: Shutdown,
}

impl SignalCoordinator {
    pub fn new(shutdown: Shutdown) -> Self {
        Self {
            state: State::Armed,
            shutdown,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Process a single signal
    ///
    /// Returns `true` when `signal` requested the shutdown.
    pub fn handle(&mut self, signal: Signal) -> Result<bool, ShutdownError> {
        match self.state {
            State::Armed if signal.is_interrupt() => {
                tracing::info!(?signal, "got signal, shutting down...");
                self.state = State::ShuttingDown;
                self.shutdown.fire()?;
                Ok(true)
            }
            State::Armed => {
                tracing::debug!(?signal, "ignoring signal");
                Ok(false)
            }
            State::ShuttingDown => {
                tracing::debug!(?signal, "already shutting down");
                Ok(false)
            }
        }
    }

    /// Consume `signals` until the source is closed
    pub fn run<I>(mut self, signals: I) -> Result<State, ShutdownError>
    where
        I: IntoIterator<Item = Signal>,
    {
        for signal in signals {
            self.handle(signal)?;
        }
        tracing::trace!(state = ?self.state, "signal channel closed");
        Ok(self.state)
    }

    /// [SignalCoordinator::run] in a dedicated thread, logging to `dispatch`
    pub fn spawn<I>(
        self,
        signals: I,
        dispatch: Dispatch,
    ) -> std::io::Result<JoinHandle<Result<State, ShutdownError>>>
    where
        I: IntoIterator<Item = Signal> + Send + 'static,
    {
        std::thread::Builder::new()
            .name(String::from("signals"))
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    self.run(signals)
                        .inspect_err(|err| tracing::error!(?err, "signal handling failed"))
                })
            })
    }
}
