//! novatel: pose watcher and stream diagnostics for NovAtel GPS/INS receivers.
//!
//! Subcommands:
//! - `watch`:  run the ingestion client and print the time-aligned pose
//! - `dump`:   print raw receiver lines and the sentences decoded from them
//! - `config`: print the effective configuration

use std::io::Read;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use novatel_client::{connect, NovatelClient};
use novatel_core::config::serialize_config;
use novatel_core::types::now;
use novatel_core::{classify, ClientConfig, FrameSplitter, Pose};

mod logging;
mod settings;

#[derive(Parser)]
#[command(name = "novatel", version, about = "NovAtel GPS/INS pose client")]
struct Cli {
    /// Config file (print one with `novatel config`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Receiver host
    #[arg(long, global = true, env = "NOVATEL_HOST")]
    host: Option<String>,

    /// Receiver TCP port
    #[arg(long, global = true, env = "NOVATEL_PORT")]
    port: Option<u16>,

    /// Max seconds between position and heading timestamps
    #[arg(long, global = true)]
    max_skew: Option<f64>,

    /// Seconds of heading history to keep
    #[arg(long, global = true)]
    window: Option<f64>,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream from the receiver and print the time-aligned pose
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "20")]
        interval_ms: u64,

        /// Also print poses without an aligned heading
        #[arg(short, long)]
        all: bool,

        /// Print poses as JSON lines
        #[arg(long)]
        json: bool,

        /// Warn when the position is older than this many seconds
        #[arg(long, default_value = "1.0")]
        max_age: f64,
    },

    /// Print raw receiver lines and decoded sentences
    Dump {
        /// Print decoded sentences as JSON
        #[arg(long)]
        json: bool,

        /// Only print sentences that decode
        #[arg(short, long)]
        decoded_only: bool,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    fn overrides(&self) -> settings::Overrides {
        settings::Overrides {
            host: self.host.clone(),
            port: self.port,
            max_skew: self.max_skew,
            window: self.window,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = settings::resolve(cli.config.as_deref(), &cli.overrides()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });

    match cli.command {
        Commands::Watch {
            interval_ms,
            all,
            json,
            max_age,
        } => cmd_watch(config, interval_ms, all, json, max_age),
        Commands::Dump { json, decoded_only } => cmd_dump(&config, json, decoded_only),
        Commands::Config => print!("{}", serialize_config(&config)),
    }
}

fn cmd_watch(config: ClientConfig, interval_ms: u64, all: bool, json: bool, max_age: f64) {
    let client = NovatelClient::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });
    if let Err(e) = client.start() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let interval = Duration::from_millis(interval_ms);
    let mut stale_warned = false;

    loop {
        thread::sleep(interval);

        if !client.is_running() {
            let reason = client
                .last_exit()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".into());
            eprintln!("Receiver stream ended: {reason}");
            std::process::exit(1);
        }

        let Some(pose) = client.get_pose() else {
            continue;
        };

        if pose.is_stale(now(), max_age) {
            if !stale_warned {
                warn!(age_secs = format!("{:.2}", pose.age(now())), "Position is stale");
                stale_warned = true;
            }
            continue;
        }
        if stale_warned {
            info!("Position updates resumed");
            stale_warned = false;
        }

        if pose.has_heading() || all {
            print_pose(&pose, json);
        }
    }
}

fn print_pose(pose: &Pose, json: bool) {
    if json {
        match serde_json::to_string(pose) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Failed to encode pose"),
        }
        return;
    }

    match pose.heading_deg() {
        Some(yaw) => println!(
            "lat={:.8}, lon={:.8}, yaw={:.2}",
            pose.latitude(),
            pose.longitude(),
            yaw
        ),
        None => println!(
            "lat={:.8}, lon={:.8}, yaw=-",
            pose.latitude(),
            pose.longitude()
        ),
    }
}

fn cmd_dump(config: &ClientConfig, json: bool, decoded_only: bool) {
    let mut stream = connect(config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    eprintln!("Connected to {}", config.addr());

    let mut splitter = FrameSplitter::new(config.max_line_len);
    let mut buf = [0u8; 4096];
    let mut lines = 0u64;
    let mut decoded = 0u64;

    loop {
        let len = match stream.read(&mut buf) {
            Ok(0) => {
                eprintln!("Connection closed by receiver");
                break;
            }
            Ok(len) => len,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("Socket error: {e}");
                break;
            }
        };

        splitter.extend(&buf[..len]);
        while let Some(item) = splitter.next_line() {
            let line = match item {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Skipping oversized line");
                    continue;
                }
            };
            lines += 1;

            let sentence = classify(&line);
            if !decoded_only {
                println!("{line}");
            }
            let Some(sentence) = sentence else {
                continue;
            };
            decoded += 1;

            if json {
                match serde_json::to_string(&sentence) {
                    Ok(text) => println!("  {text}"),
                    Err(e) => warn!(error = %e, "Failed to encode sentence"),
                }
            } else {
                println!("  {:?}", sentence);
            }
        }
    }

    eprintln!("{lines} lines, {decoded} decoded");
}
