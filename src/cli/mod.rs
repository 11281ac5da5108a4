pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "peerping")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discovers peer pods of a mesh-connectivity checker", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to a YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Label selector identifying peer pods")]
    pub label_selector: Option<String>,

    #[arg(short, long, global = true, help = "Kubernetes namespace to discover peers in")]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List running peers once")]
    Peers {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, help = "Output format")]
        output: OutputFormat,
    },
    #[command(about = "Poll for peers and report changes")]
    Watch {
        #[arg(short, long, default_value_t = 30, help = "Seconds between polls")]
        interval: u64,
    },
    #[command(about = "Show the detected pod namespace")]
    Namespace,
    #[command(about = "Run one discovery and print Prometheus metrics")]
    Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
