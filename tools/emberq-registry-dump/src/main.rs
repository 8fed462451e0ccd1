// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! emberq-registry-dump - Dump live registry state
//!
//! Shows registered broker servers and subscription bindings per topic, and
//! can stay attached to print discovery events as they happen.

use clap::Parser;
use colored::*;
use emberq_registry::{
    Binding, CoordinationConfig, CoordinationSession, NodeEventKind, RegistryClient, WatchSession,
    Watcher,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Dump live registry state
#[derive(Parser, Debug)]
#[command(name = "emberq-registry-dump")]
#[command(version = "0.1.0")]
#[command(about = "Dump emberq registry state (servers, bindings)")]
struct Args {
    /// Coordination endpoints (comma-separated host:port list)
    #[arg(short, long, default_value = "localhost:2181")]
    endpoints: String,

    /// Topics to dump
    #[arg(required = true)]
    topics: Vec<String>,

    /// Connection timeout in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Stay attached and print discovery events until Ctrl+C
    #[arg(short = 'w', long)]
    watch: bool,

    /// Quiet mode - compact output
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Prints classified discovery events as they arrive.
struct PrintWatcher;

impl Watcher for PrintWatcher {
    fn event_notify(&self, path: &str, kind: NodeEventKind, bindings: Option<Vec<Binding>>) {
        match kind {
            NodeEventKind::Created => println!("{} {}", "created".green(), path),
            NodeEventKind::Deleted => println!("{} {}", "deleted".red(), path),
            NodeEventKind::Changed => {
                let count = bindings.map_or(0, |b| b.len());
                println!("{} {} ({} binding(s))", "changed".yellow(), path, count);
            }
            NodeEventKind::ChildSetChanged => {}
        }
    }

    fn child_watcher(&self, path: &str, children: Vec<String>) {
        println!("{} {} -> {:?}", "children".cyan(), path, children);
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if !args.quiet {
        eprintln!(
            "{} Registry dump (endpoints={})",
            ">>>".green().bold(),
            args.endpoints
        );
    }

    let config = CoordinationConfig::from_endpoint_list(&args.endpoints)
        .with_connect_timeout(Duration::from_secs(args.timeout));
    let session = Arc::new(CoordinationSession::connect(config)?);
    let registry = RegistryClient::new(session)?;
    let discovery = registry.discovery();

    // One watch session per armed path; kept alive for --watch mode.
    let mut sessions = Vec::new();

    for topic in &args.topics {
        let mut server_session = WatchSession::new(Arc::new(PrintWatcher));
        let servers = discovery.servers_and_watch(topic, &mut server_session)?;

        let mut binding_session = WatchSession::new(Arc::new(PrintWatcher));
        let bindings = discovery.bindings_and_watch(topic, &mut binding_session)?;

        match args.format {
            OutputFormat::Pretty => print_pretty(topic, &servers, &bindings, args.quiet),
            OutputFormat::Json => print_json(topic, &servers, &bindings)?,
        }

        sessions.push(server_session);
        sessions.push(binding_session);
    }

    if args.watch {
        if !args.quiet {
            eprintln!("{} Watching (Ctrl+C to stop)...", ">>>".green().bold());
        }
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    Ok(())
}

fn print_pretty(topic: &str, servers: &[String], bindings: &[Binding], quiet: bool) {
    println!("{} {}", "Topic".bold(), topic.bold().blue());

    if servers.is_empty() {
        println!("  {} (none)", "servers:".dimmed());
    } else {
        println!("  {}", "servers:".dimmed());
        for server in servers {
            println!("    {}", server.green());
        }
    }

    if bindings.is_empty() {
        println!("  {} (none)", "bindings:".dimmed());
    } else {
        println!("  {}", "bindings:".dimmed());
        for binding in bindings {
            let rule = if binding.rule.is_empty() {
                "*".to_string()
            } else {
                binding.rule.clone()
            };
            println!(
                "    {} rule={} persistent={}",
                binding.group_id.yellow(),
                rule,
                binding.persistent
            );
        }
    }

    if !quiet {
        println!();
    }
}

fn print_json(
    topic: &str,
    servers: &[String],
    bindings: &[Binding],
) -> Result<(), Box<dyn std::error::Error>> {
    let dump = serde_json::json!({
        "topic": topic,
        "servers": servers,
        "bindings": bindings,
    });
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
