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

use std::{env::var, io::IsTerminal};

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{
        self, MakeWriter,
        format::{DefaultFields, Format},
    },
    registry::LookupSpan,
};

pub fn is_log_color<T>(output: &T) -> bool
where
    T: IsTerminal,
{
    match var("RUST_LOG_STYLE")
        .or_else(|_| var("LOG_COLOR"))
        .unwrap_or_else(|_| String::from("auto"))
        .to_lowercase()
        .as_str()
    {
        "never" | "no" | "0" | "false" => false,
        "always" | "yes" | "1" | "true" => true,
        _ => output.is_terminal() && !var("NO_COLOR").is_ok_and(|v| !v.is_empty()),
    }
}

fn get_var<S>(name: S) -> Option<bool>
where
    S: AsRef<str>,
{
    var(name.as_ref())
        .ok()
        .map(|value| !matches!(value.to_lowercase().as_str(), "never" | "no" | "0" | "false" | ""))
}

/// Build the log formatting layer
///
/// ## Configuration from env
///
/// - LOG_SRC_FILE:    show source files (default `false`)
/// - LOG_THREAD_ID:   show thread ids (default `false`)
/// - LOG_THREAD_NAME: show thread names (default `false`)
/// - LOG_TARGET:      show log targets (default `false`)
pub fn fmt_layer<S, W>(writer: W, ansi: bool) -> fmt::Layer<S, DefaultFields, Format, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    let log_src_file = get_var("LOG_SRC_FILE").unwrap_or(false);
    fmt::layer()
        .with_thread_ids(get_var("LOG_THREAD_ID").unwrap_or(false))
        .with_thread_names(get_var("LOG_THREAD_NAME").unwrap_or(false))
        .with_file(log_src_file)
        .with_line_number(log_src_file)
        .with_target(get_var("LOG_TARGET").unwrap_or(false))
        .with_ansi(ansi)
        .with_writer(writer)
}
