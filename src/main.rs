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
** Created on: 2025-12-22T15:46:40
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::process::ExitCode;

use esm::{
    agent::Esm,
    bootstrap::{Bootstrap, Failure, Terminal},
    utils::signal::SignalSet,
};

fn main() -> ExitCode {
    // mask must be set before any thread is spawned to be inherited
    let signals = match SignalSet::catchable().and_then(SignalSet::subscribe) {
        Ok(signals) => signals,
        Err(err) => {
            eprintln!("failed to setup signal handling: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match Bootstrap::new(signals, Terminal::default()).run::<Esm, _, _>(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Fatal(err)) => panic!("{err:?}"),
        Err(err) => ExitCode::from(err.exit_code().unwrap_or(1)),
    }
}
