//! process-log: flag anomalous purchases in a social network event stream.
//!
//! Usage:
//!   process-log batch_log.json stream_log.json flagged_purchases.json
//!   process-log batch_log.json stream_log.json flagged_purchases.json --db audit.db
//!   process-log batch_log.json stream_log.json -    (flags to stdout)
//!   process-log generate --seed 42 --users 100 --batch-events 5000 \
//!       --stream-events 1000 --out-dir ./log_input

use anomaly_core::{
    generator::{GeneratorConfig, LogGenerator},
    network::Mode,
    processor::LogProcessor,
    sink::JsonLinesSink,
    store::AuditStore,
};
use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const USAGE: &str = "usage:\n  \
    process-log <batch_log> <stream_log> <flagged_out|-> [--db <path>]\n  \
    process-log generate [--seed N] [--users N] [--batch-events N] \
    [--stream-events N] [--degrees N] [--window N] [--out-dir DIR]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("generate") {
        return run_generate(&args[1..]);
    }

    let positional = positional_args(&args);
    if positional.len() != 3 {
        eprintln!("{USAGE}");
        bail!("expected 3 positional arguments, got {}", positional.len());
    }
    let db = flag_value(&args, "--db");

    run_detection(positional[0], positional[1], positional[2], db)
}

fn run_detection(batch: &str, stream: &str, out: &str, db: Option<&str>) -> Result<()> {
    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    let started_at = chrono::Utc::now().to_rfc3339();

    let to_stdout = out == "-";
    if !to_stdout {
        println!("process-log");
        println!("  run_id:  {run_id}");
        println!("  batch:   {batch}");
        println!("  stream:  {stream}");
        println!("  output:  {out}");
        if let Some(db) = db {
            println!("  db:      {db}");
        }
        println!();
    }

    let batch_reader = BufReader::new(
        File::open(batch).with_context(|| format!("Cannot open batch log {batch}"))?,
    );
    let mut processor = match db {
        Some(path) => {
            let store = AuditStore::open(path)?;
            store.migrate()?;
            LogProcessor::from_batch_audited(batch_reader, store, run_id.clone(), &started_at)?
        }
        None => LogProcessor::from_batch(batch_reader)?,
    };

    let stream_reader = BufReader::new(
        File::open(stream).with_context(|| format!("Cannot open stream log {stream}"))?,
    );
    let writer: Box<dyn Write> = if to_stdout {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(out).with_context(|| format!("Cannot create {out}"))?)
    };
    let mut sink = JsonLinesSink::new(BufWriter::new(writer));
    processor.process_stream(stream_reader, &mut sink)?;
    log::info!("Wrote {} flagged purchases to {out}", sink.written());

    // stdout carries only flagged records in that case.
    if !to_stdout {
        print_summary(&processor, &run_id, sink.written());
    }
    Ok(())
}

fn print_summary(processor: &LogProcessor, run_id: &str, written: usize) {
    let network = processor.network();
    let config = network.config();
    let batch = processor.stats(Mode::Batch);
    let stream = processor.stats(Mode::Stream);

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {run_id}");
    println!("  D / T:           {} / {}", config.degrees, config.window);
    println!("  users:           {}", network.graph().node_count());
    println!("  friendships:     {}", network.graph().edge_count());
    println!("  batch events:    {}", batch.events_applied());
    println!("  stream events:   {}", stream.events_applied());
    println!("  unknown skipped: {}", batch.unknown_skipped + stream.unknown_skipped);
    println!("  out of order:    {}", batch.out_of_order + stream.out_of_order);
    println!("  flagged:         {written}");
}

fn run_generate(args: &[String]) -> Result<()> {
    let defaults = GeneratorConfig::default();
    let config = GeneratorConfig {
        seed:          parse_arg(args, "--seed", defaults.seed)?,
        users:         parse_arg(args, "--users", defaults.users)?,
        degrees:       parse_arg(args, "--degrees", defaults.degrees)?,
        window:        parse_arg(args, "--window", defaults.window)?,
        batch_events:  parse_arg(args, "--batch-events", defaults.batch_events)?,
        stream_events: parse_arg(args, "--stream-events", defaults.stream_events)?,
        ..defaults
    };
    let out_dir = flag_value(args, "--out-dir").unwrap_or("./log_input");

    let logs = LogGenerator::new(config.clone())?.generate();
    let (batch_path, stream_path) = logs.write_to_dir(Path::new(out_dir))?;

    println!("Generated logs (seed {})", config.seed);
    println!("  {} ({} lines)", batch_path.display(), logs.batch.len());
    println!("  {} ({} lines)", stream_path.display(), logs.stream.len());
    Ok(())
}

/// Arguments that are neither flags nor flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value for {flag}: {raw:?}")),
        None => Ok(default),
    }
}
