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
** Created on: 2026-10-03T09:12:44
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    fmt::Debug,
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing_subscriber::fmt::{MakeWriter, writer::BoxMakeWriter};

struct Gate {
    released: bool,
    pending: Vec<Vec<u8>>,
    output: BoxMakeWriter,
}

/// Writer holding everything back until [GatedWriter::release]
///
/// Clones share the same gate.
#[derive(Clone)]
pub struct GatedWriter(Arc<Mutex<Gate>>);

impl Debug for GatedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gate = self.lock();
        f.debug_struct("GatedWriter")
            .field("released", &gate.released)
            .field("pending", &gate.pending.len())
            .finish()
    }
}

impl GatedWriter {
    pub fn new<W>(output: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self(Arc::new(Mutex::new(Gate {
            released: false,
            pending: Vec::new(),
            output: BoxMakeWriter::new(output),
        })))
    }

    fn lock(&self) -> MutexGuard<'_, Gate> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the gate
    ///
    /// Held-back writes are emitted in order, subsequent writes go straight
    /// through. Releasing an opened gate does nothing.
    ///
    /// Every held-back write is attempted, the first error is returned.
    pub fn release(&self) -> io::Result<()> {
        let mut gate = self.lock();
        if gate.released {
            return Ok(());
        }
        gate.released = true;

        let pending = std::mem::take(&mut gate.pending);
        let mut output = gate.output.make_writer();
        let mut ret = Ok(());
        for chunk in pending {
            if let Err(err) = output.write_all(&chunk) {
                tracing::trace!(?err, "failed to release log chunk");
                ret = ret.and(Err(err));
            }
        }
        ret.and(output.flush())
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }
}

impl Write for GatedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut gate = self.lock();
        if gate.released {
            gate.output.make_writer().write_all(buf)?;
        } else {
            gate.pending.push(buf.to_vec());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let gate = self.lock();
        if gate.released {
            gate.output.make_writer().flush()
        } else {
            Ok(())
        }
    }
}

impl<'a> MakeWriter<'a> for GatedWriter {
    type Writer = GatedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
