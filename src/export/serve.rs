// Launcher for the JavaScript front end.
//
// Copies the template env file into place, frees the port if an older
// server still holds it, and starts `npm start` in the web directory. The
// server keeps running after topicmap exits.

use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;

/// Template env file shipped with the front end, and its live name.
const ENV_TEMPLATE: &str = "env.model";
const ENV_FILE: &str = ".env";

/// Start the front end from `web_dir` on `port`.
pub fn start(web_dir: &Path, port: u16) -> Result<Child> {
    if !web_dir.join("package.json").exists() {
        anyhow::bail!(
            "No front end found in {} (package.json missing). Set TOPICMAP_WEB_DIR.",
            web_dir.display()
        );
    }

    let template = web_dir.join(ENV_TEMPLATE);
    if template.exists() {
        std::fs::copy(&template, web_dir.join(ENV_FILE))
            .with_context(|| format!("Failed to copy {}", template.display()))?;
    }

    if port_in_use(port) {
        info!(port, "Server on port {port} is already running. Killing it...");
        stop_listener(port)?;
    }

    let child = Command::new("npm")
        .arg("start")
        .current_dir(web_dir)
        .env("PORT", port.to_string())
        .stdin(Stdio::null())
        .spawn()
        .context("Failed to run `npm start`; is Node.js installed?")?;

    info!(pid = child.id(), port, "NPM server started");
    Ok(child)
}

/// True when something is already bound to `port` on localhost.
pub fn port_in_use(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_err()
}

/// Kill whatever process listens on `port`, found through `lsof`.
fn stop_listener(port: u16) -> Result<()> {
    let output = Command::new("lsof")
        .args(["-t", "-i", &format!("tcp:{port}")])
        .output()
        .context("Failed to run lsof to find the process holding the port")?;

    let pids = parse_pids(&String::from_utf8_lossy(&output.stdout));
    if pids.is_empty() {
        warn!(port, "Port is busy but no owning process was found");
        return Ok(());
    }

    for pid in pids {
        let status = Command::new("kill")
            .arg(pid.to_string())
            .status()
            .with_context(|| format!("Failed to kill process {pid}"))?;
        if !status.success() {
            warn!(pid, "kill exited with {status}");
        }
    }
    Ok(())
}

fn parse_pids(lsof_output: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = lsof_output
        .lines()
        .filter_map(|l| l.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}
