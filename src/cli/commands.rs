//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Load Sparkify song and event logs into a partitioned Parquet star schema
#[derive(Parser, Debug)]
#[command(name = "sparkify-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, env = "SPARKIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input root holding song_data/ and log_data/
    /// Supports: /path, file:///path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long, env = "SPARKIFY_INPUT")]
    pub input: Option<String>,

    /// Output root for the five tables (same URL forms as --input)
    #[arg(short, long, env = "SPARKIFY_OUTPUT")]
    pub output: Option<String>,

    /// Worker threads for table builds (0 = one per core)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Records per shard
    #[arg(long)]
    pub shard_size: Option<usize>,

    /// Report format printed on success
    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report on stdout
    Json,
    /// Human-readable report on stdout
    Pretty,
    /// Logs only
    Quiet,
}
