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
** Author: Sylvain Fargier <fargier.sylvain@gmail.com>
*/

use std::{
    ffi::OsStr,
    io::{BufRead, BufReader, Read},
    process::{Child, ChildStdout, Command, Output, Stdio},
};

use anyhow::{Context, Result, ensure};
use esm::utils::{
    MkTemp,
    signal::{SIGHUP, SIGINT, Signal},
};

const TRAILER: &str = "Log data will now stream in as it occurs:";

fn esm<I, S>(args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_esm"));
    cmd.args(args)
        .env_remove("ESM_LOG")
        .env("NO_COLOR", "1")
        .stdin(Stdio::null());
    cmd
}

fn run<I, S>(args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    esm(args).output().context("failed to run esm")
}

/// Spawn a monitoring process, returning once its banner is displayed
fn start<I, S>(args: I) -> Result<(Child, Vec<String>, BufReader<ChildStdout>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = esm(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn esm")?;
    let mut stdout = BufReader::new(child.stdout.take().context("no stdout")?);

    let mut banner = Vec::new();
    loop {
        let mut line = String::new();
        ensure!(stdout.read_line(&mut line)? != 0, "banner not found: {banner:?}");
        let line = line.trim_end().to_string();
        let done = line == TRAILER;
        banner.push(line);
        if done {
            return Ok((child, banner, stdout));
        }
    }
}

fn interrupt(mut child: Child, mut stdout: BufReader<ChildStdout>) -> Result<String> {
    let pid = child.id() as libc::pid_t;
    Signal::kill(pid, SIGHUP)?;
    for _ in 0..3 {
        Signal::kill(pid, SIGINT)?;
    }
    let mut logs = String::new();
    stdout.read_to_string(&mut logs)?;
    let status = child.wait()?;
    ensure!(status.success(), "esm failed: {status:?}\n{logs}");
    Ok(logs)
}

#[test]
fn help() -> Result<()> {
    let output = run(["-help"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--config-file <PATH>"), "{stdout}");
    assert!(stdout.contains("--config-dir <PATH>"), "{stdout}");
    Ok(())
}

#[test]
fn usage_error() -> Result<()> {
    let output = run(["-bogus"])?;
    assert_eq!(Some(1), output.status.code());
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
    Ok(())
}

#[test]
fn unreadable_config_dir() -> Result<()> {
    let dir = MkTemp::dir("esm-cli-missing")?;
    let missing = dir.path().join("missing.d");

    let output = run([OsStr::new("-config-dir"), missing.as_os_str()])?;
    assert_eq!(Some(1), output.status.code());
    assert!(output.stdout.is_empty(), "nothing should be displayed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.d"), "{stderr}");
    Ok(())
}

#[test]
fn invalid_config() -> Result<()> {
    let dir = MkTemp::dir("esm-cli-invalid")?;
    let file = dir.write("esm.hcl", "service = \n")?;

    let output = run([OsStr::new("-config-file"), file.as_os_str()])?;
    assert_eq!(Some(1), output.status.code());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("esm.hcl"), "{stderr}");
    Ok(())
}

#[test]
fn layered_files() -> Result<()> {
    let dir = MkTemp::dir("esm-cli-files")?;
    let a = dir.write("a.hcl", "service = \"x\"\n")?;
    let b = dir.write("b.hcl", "leader_key = \"y\"\n")?;

    let (child, banner, stdout) = start([
        OsStr::new("-config-file"),
        a.as_os_str(),
        OsStr::new("-config-file"),
        b.as_os_str(),
    ])?;
    assert_eq!(
        banner,
        [
            "Consul ESM running!",
            "            Datacenter: (default)",
            "               Service: \"x\"",
            "            Leader Key: \"y\"",
            "Node Reconnect Timeout: \"3days\"",
            "",
            TRAILER,
        ]
    );

    let logs = interrupt(child, stdout)?;
    // logs emitted before the banner are released after it
    assert!(logs.contains("configuration loaded"), "{logs}");
    assert_eq!(1, logs.matches("got signal, shutting down...").count(), "{logs}");
    assert!(logs.contains("shutdown complete"), "{logs}");
    Ok(())
}

#[test]
fn config_dir() -> Result<()> {
    let dir = MkTemp::dir("esm-cli-dir")?;
    dir.write(
        "conf.d/10-base.json",
        r#"{"service": "base", "datacenter": "dc1", "node_reconnect_timeout": "1h"}"#,
    )?;
    dir.write("conf.d/20-override.yml", "service: override\n")?;
    dir.write("conf.d/README.txt", "service = \"ignored\"\n")?;
    dir.write("conf.d/nested/30-nested.hcl", "service = \"nested\"\n")?;
    let last = dir.write("last.hcl", "datacenter = \"dc2\"\n")?;

    let (child, banner, stdout) = start([
        OsStr::new("-config-dir"),
        dir.path().join("conf.d").as_os_str(),
        OsStr::new("--config-file"),
        last.as_os_str(),
    ])?;
    assert_eq!(banner[1], "            Datacenter: \"dc2\"");
    assert_eq!(banner[2], "               Service: \"override\"");
    assert_eq!(banner[3], "            Leader Key: \"consul-esm/lock\"");
    assert_eq!(banner[4], "Node Reconnect Timeout: \"1h\"");

    interrupt(child, stdout)?;
    Ok(())
}
