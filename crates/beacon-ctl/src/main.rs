//! beacon-ctl — command-line interface for the Beacon daemon.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 5000;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Serialize)]
struct AnnounceRequest {
    system_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_name: Option<String>,
}

#[derive(Deserialize)]
struct AnnounceResponse {
    message: String,
}

#[derive(Deserialize)]
struct AvailableResponse {
    count:   usize,
    systems: HashMap<String, SystemInfo>,
}

#[derive(Deserialize)]
struct SystemInfo {
    ip_address:     String,
    port:           u16,
    system_name:    String,
    last_seen_secs: u64,
}

#[derive(Deserialize)]
struct RemoveResponse {
    system_id: String,
    removed:   bool,
}

// ── HTTP helpers ──────────────────────────────────────────────────────────────

fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    reqwest::get(url)
    .await
    .with_context(|| format!("failed to connect to beacond at {} — is it running?", url))?
    .json::<T>()
    .await
    .context("failed to parse response")
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_list(port: u16) -> Result<()> {
    let resp: AvailableResponse = get_json(&format!("{}/available", base_url(port))).await?;

    if resp.systems.is_empty() {
        println!("No systems currently available.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Available Systems ({})", resp.count);
    println!("═══════════════════════════════════════");

    for (id, s) in &resp.systems {
        println!("  ┌─ {}", id);
        println!("  │  name      : {}", s.system_name);
        println!("  │  address   : {}:{}", s.ip_address, s.port);
        println!("  └─ last seen : {}s ago", s.last_seen_secs);
    }

    Ok(())
}

async fn cmd_announce(port: u16, req: AnnounceRequest) -> Result<()> {
    let resp: AnnounceResponse = reqwest::Client::new()
        .post(format!("{}/announce", base_url(port)))
        .json(&req)
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {} — is it running?", base_url(port)))?
        .json()
        .await
        .context("failed to parse response")?;

    println!("{}", resp.message);
    Ok(())
}

async fn cmd_remove(port: u16, system_id: &str) -> Result<()> {
    let resp: RemoveResponse = reqwest::Client::new()
        .delete(format!("{}/remove/{}", base_url(port), system_id))
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {} — is it running?", base_url(port)))?
        .json()
        .await
        .context("failed to parse response")?;

    if resp.removed {
        println!("System {} removed.", resp.system_id);
    } else {
        println!("System {} was not registered.", resp.system_id);
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: beacon-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  list                                List currently available systems");
    println!("  announce <id> <sys-port> [name]     Announce a system (address inferred)");
    println!("  remove <id>                         Remove a system from the registry");
    println!();
    println!("Options:");
    println!("  --port <port>   Daemon API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args.get(i)
            .context("--port requires a value")?
            .parse()
            .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["list"] | []                  => cmd_list(port).await,
        ["announce", id, sys_port]     => {
            let sys_port: u16 = sys_port.parse().context("system port must be a number")?;
            cmd_announce(port, AnnounceRequest {
                system_id: id.to_string(),
                ip_address: None,
                port: sys_port,
                system_name: None,
            }).await
        }
        ["announce", id, sys_port, name] => {
            let sys_port: u16 = sys_port.parse().context("system port must be a number")?;
            cmd_announce(port, AnnounceRequest {
                system_id: id.to_string(),
                ip_address: None,
                port: sys_port,
                system_name: Some(name.to_string()),
            }).await
        }
        ["remove", id]                 => cmd_remove(port, id).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
