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
** Created on: 2026-10-07T11:02:48
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

//! External Service Monitor
//!
//! Process bootstrap for an agent monitoring external services: layered
//! configuration loading, gated log output and signal driven shutdown.

pub mod agent;
pub mod bootstrap;
pub mod cmdline;
pub mod config;
pub mod logging;
pub mod shutdown;
pub mod signals;
pub mod utils;
