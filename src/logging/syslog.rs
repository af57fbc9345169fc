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
** Created on: 2026-10-03T11:37:08
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    fmt::{Debug, Write},
    io,
    os::unix::net::UnixDatagram,
    path::Path,
    str::FromStr,
};

use tracing::{Event, Level, Subscriber, field::Field};
use tracing_subscriber::{Layer, layer::Context};

use super::LogSetupError;

const SYSLOG_SOCKETS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];
const SYSLOG_TAG: &str = "esm";

/// Syslog facility code (already shifted, as in `<syslog.h>`)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Facility(libc::c_int);

const FACILITIES: [(&str, libc::c_int); 20] = [
    ("KERN", libc::LOG_KERN),
    ("USER", libc::LOG_USER),
    ("MAIL", libc::LOG_MAIL),
    ("DAEMON", libc::LOG_DAEMON),
    ("AUTH", libc::LOG_AUTH),
    ("SYSLOG", libc::LOG_SYSLOG),
    ("LPR", libc::LOG_LPR),
    ("NEWS", libc::LOG_NEWS),
    ("UUCP", libc::LOG_UUCP),
    ("CRON", libc::LOG_CRON),
    ("AUTHPRIV", libc::LOG_AUTHPRIV),
    ("FTP", libc::LOG_FTP),
    ("LOCAL0", libc::LOG_LOCAL0),
    ("LOCAL1", libc::LOG_LOCAL1),
    ("LOCAL2", libc::LOG_LOCAL2),
    ("LOCAL3", libc::LOG_LOCAL3),
    ("LOCAL4", libc::LOG_LOCAL4),
    ("LOCAL5", libc::LOG_LOCAL5),
    ("LOCAL6", libc::LOG_LOCAL6),
    ("LOCAL7", libc::LOG_LOCAL7),
];

impl FromStr for Facility {
    type Err = LogSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        FACILITIES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| Facility(*code))
            .ok_or_else(|| LogSetupError::Facility(s.to_string()))
    }
}

impl Debug for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match FACILITIES.iter().find(|(_, code)| *code == self.0) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "Facility({})", self.0),
        }
    }
}

fn severity(level: &Level) -> libc::c_int {
    match *level {
        Level::ERROR => libc::LOG_ERR,
        Level::WARN => libc::LOG_WARNING,
        Level::INFO => libc::LOG_INFO,
        _ => libc::LOG_DEBUG,
    }
}

/// Local syslog daemon connection
#[derive(Debug)]
pub struct Syslog {
    socket: UnixDatagram,
    facility: Facility,
    pid: u32,
}

impl Syslog {
    /// Connect to the first reachable local syslog socket
    pub fn connect(facility: Facility) -> io::Result<Self> {
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no syslog socket found");
        for path in SYSLOG_SOCKETS {
            match Self::connect_to(path, facility) {
                Ok(syslog) => return Ok(syslog),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    pub fn connect_to<P>(path: P, facility: Facility) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path)?;
        Ok(Self {
            socket,
            facility,
            pid: std::process::id(),
        })
    }

    /// Send a single message, formatted as a local RFC 3164 datagram
    pub fn send(&self, level: &Level, message: &str) -> io::Result<()> {
        let datagram = format!(
            "<{}>{} {}[{}]: {}",
            self.facility.0 | severity(level),
            chrono::Local::now().format("%b %e %H:%M:%S"),
            SYSLOG_TAG,
            self.pid,
            message
        );
        self.socket.send(datagram.as_bytes()).map(|_| ())
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Layer forwarding events to syslog
pub struct SyslogLayer(Syslog);

impl SyslogLayer {
    pub fn new(syslog: Syslog) -> Self {
        Self(syslog)
    }
}

impl<S> Layer<S> for SyslogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let level = event.metadata().level();
        // logging failures can't be logged
        let _ = self.0.send(
            level,
            &format!("[{}] {}{}", level, visitor.message, visitor.fields),
        );
    }
}
