//! CLI runner - loads configuration and executes the pipeline

use crate::cli::commands::{Cli, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PipelineReport};
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the pipeline once
    pub async fn run(&self) -> Result<PipelineReport> {
        let config = self.load_config()?;
        debug!("Resolved configuration: {config:?}");

        let pipeline = Pipeline::new(config)?;
        let report = pipeline.run().await?;
        self.output_report(&report)?;
        Ok(report)
    }

    /// Merge the config file (if any) with command-line overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => {
                let input = self
                    .cli
                    .input
                    .clone()
                    .ok_or_else(|| Error::missing_field("input_root (use --input or --config)"))?;
                let output = self.cli.output.clone().ok_or_else(|| {
                    Error::missing_field("output_root (use --output or --config)")
                })?;
                PipelineConfig::new(input, output)
            }
        };

        if let Some(input) = &self.cli.input {
            config.input_root.clone_from(input);
        }
        if let Some(output) = &self.cli.output {
            config.output_root.clone_from(output);
        }
        if let Some(workers) = self.cli.workers {
            config.workers = workers;
        }
        if let Some(shard_size) = self.cli.shard_size {
            config.shard_size = shard_size;
        }

        config.validate()?;
        Ok(config)
    }

    fn output_report(&self, report: &PipelineReport) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
            OutputFormat::Pretty => {
                println!("run {} ({} ms)", report.run_id, report.duration_ms);
                for table in &report.tables {
                    println!(
                        "  {:<10} {:>8} rows  {:>5} files",
                        table.table, table.rows, table.files
                    );
                }
                println!(
                    "  parse failures: {}, schema drops: {}, unmatched plays: {}",
                    report.parse_failures, report.schema_drops, report.unmatched_plays
                );
            }
            OutputFormat::Quiet => {}
        }
        Ok(())
    }
}
