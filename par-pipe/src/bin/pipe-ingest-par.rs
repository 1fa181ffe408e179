//! CLI tool to run the record pipeline over JSON-lines files on a worker pool.

use clap::Parser;
use jsonl_pipes::cli::{open_output, repeat_inputs, setup_logging};
use jsonl_pipes::{
    ConfigOverrides, CountingSink, Executor, JsonLinesSink, JsonLinesSource, PipelineConfig,
    PipelineError, Sink,
};
use par_pipe::{ParallelReport, run_parallel};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

/// Validate, filter, transform and persist JSON-lines records, one worker per file.
///
/// Accepts the same options as pipe-ingest, plus --workers.
#[derive(Parser)]
#[command(name = "pipe-ingest-par")]
struct Cli {
    /// Input files (one JSON record per line)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

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

fn run<K: Sink>(
    config: &PipelineConfig,
    sink: K,
    inputs: &[String],
) -> Result<ParallelReport, PipelineError> {
    let executor = Executor::new(config, JsonLinesSource, sink)?;
    run_parallel(&executor, inputs, config.workers)
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let overrides = ConfigOverrides {
        workers: cli.workers,
        ..cli.overrides
    };
    let config = match PipelineConfig::resolve(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    };

    let inputs = repeat_inputs(&cli.inputs, cli.repeat);

    if cli.verbose {
        eprintln!("Workers:  {}", config.workers);
        eprintln!("Sources:  {}", inputs.len());
        match &cli.output {
            Some(path) => eprintln!("Output:   {}", path.display()),
            None => eprintln!("Output:   (discarded)"),
        }
    }

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
        Ok(report) => {
            eprintln!(
                "Processed {} sources -> {} records in {:.3} msecs",
                report.len(),
                report.total(),
                elapsed.as_secs_f64() * 1000.0
            );
            let failures: Vec<_> = report.failures().collect();
            if !failures.is_empty() {
                for outcome in &failures {
                    if let Err(e) = &outcome.result {
                        eprintln!("Failed {}: {e}", outcome.source_id);
                    }
                }
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}
