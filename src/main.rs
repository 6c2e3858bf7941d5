// Command-line entry point for deptrace.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deptrace::api::server;
use deptrace::application::trace_file;
use deptrace::infrastructure::concurrency::build_pool;
use deptrace::infrastructure::config::{TraceConfig, DEFAULT_CONFIG_FILE};
use deptrace::infrastructure::sinks::{write_json, JsonSink, JsonTarget, MemorySink};
use deptrace::infrastructure::TracingCycleReporter;
use deptrace::{CaseFile, SelfLoopPolicy};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./deptrace.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build dependency trees from JSON-lines record files
    Trace {
        /// Record file (can specify multiple; each is an independent run)
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop expanding a module once it is found to depend on itself
        #[arg(long)]
        abort_on_self_loop: bool,

        /// Emit compact JSON
        #[arg(long)]
        compact: bool,

        /// Maximum parallel runs when several inputs are given
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Accept records over TCP, one run per connection
    Serve {
        #[arg(short, long, default_value_t = 4600)]
        port: u16,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DEPTRACE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("deptrace=info,warn"));

    let format = env::var("DEPTRACE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so a case file on stdout stays clean.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TraceConfig> {
    match path {
        Some(path) if !path.exists() => {
            anyhow::bail!("Config file not found: {}", path.display())
        }
        Some(path) => TraceConfig::load(path),
        None => TraceConfig::load(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

fn trace_one(input: &Path, output: Option<PathBuf>, config: &TraceConfig) -> Result<()> {
    let reporter = TracingCycleReporter::new(config.path_context_segments);
    let target = match output {
        Some(path) => JsonTarget::File(path),
        None => JsonTarget::Stdout,
    };
    let mut sink = JsonSink::new(target, config.output.pretty);
    trace_file(input, config, &reporter, &mut sink)?;
    Ok(())
}

fn trace_many(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    config: &TraceConfig,
    jobs: Option<usize>,
) -> Result<()> {
    let pool = build_pool(jobs)?;
    let results: Vec<(String, CaseFile)> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| -> Result<(String, CaseFile)> {
                let reporter = TracingCycleReporter::new(config.path_context_segments);
                let mut sink = MemorySink::new();
                trace_file(input, config, &reporter, &mut sink)?;
                let case_file = sink
                    .take_case_file()
                    .context("run finished without a case file")?;
                Ok((input.display().to_string(), case_file))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let combined: BTreeMap<String, CaseFile> = results.into_iter().collect();
    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_json(&mut writer, &combined, config.output.pretty)?;
            writer
                .flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_json(&mut handle, &combined, config.output.pretty)?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Trace {
            input,
            output,
            abort_on_self_loop,
            compact,
            jobs,
        } => {
            if abort_on_self_loop {
                config.self_loop_policy = SelfLoopPolicy::AbortNode;
            }
            if compact {
                config.output.pretty = false;
            }
            match input.as_slice() {
                [single] => trace_one(single, output, &config),
                inputs => trace_many(inputs, output, &config, jobs),
            }
        }
        Command::Serve { port } => server::start_server(port, config),
    }
}
