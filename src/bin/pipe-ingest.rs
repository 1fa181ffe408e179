//! CLI tool to run the record pipeline sequentially over JSON-lines files.
//!
//! Usage:
//!   pipe-ingest <input.jsonl>...
//!   pipe-ingest <input.jsonl>... -o <output.jsonl> --repeat 10
//!
//! Without `-o`, records are counted and discarded.

use clap::Parser;
use jsonl_pipes::cli::{open_output, repeat_inputs, setup_logging};
use jsonl_pipes::{
    ConfigOverrides, CountingSink, Executor, JsonLinesSink, JsonLinesSource, PipelineConfig,
    PipelineError, Sink,
};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

/// Validate, filter, transform and persist JSON-lines records, one file at a time.
#[derive(Parser)]
#[command(name = "pipe-ingest")]
struct Cli {
    /// Input files (one JSON record per line)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    /// Write transformed records to this file instead of discarding them
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process the input list this many times
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn run<K: Sink>(config: &PipelineConfig, sink: K, inputs: &[String]) -> Result<usize, PipelineError> {
    let executor = Executor::new(config, JsonLinesSource, sink)?;
    executor.run_all(inputs)
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match PipelineConfig::resolve(cli.config.as_deref(), cli.overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    };

    let inputs = repeat_inputs(&cli.inputs, cli.repeat);

    let start = Instant::now();
    let result = match &cli.output {
        Some(out_path) => match open_output(out_path) {
            Ok(file) => run(&config, JsonLinesSink::new(BufWriter::new(file)), &inputs),
            Err(e) => {
                eprintln!("Error creating output file '{}': {e}", out_path.display());
                process::exit(1);
            }
        },
        None => run(&config, CountingSink, &inputs),
    };
    let elapsed = start.elapsed();

    match result {
        Ok(total) => {
            eprintln!(
                "Processed {} sources -> {total} records in {:.3} msecs",
                inputs.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}
