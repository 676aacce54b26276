use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use smhash::batch::{find_simfiles, parse_all};
use smhash::config::DEFAULT_SIMFILE_PATTERN;

/// Hash every .sm simfile under a directory and write the parsed charts as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory to search for simfiles.
    dir: PathBuf,

    /// Where to write the JSON output.
    out: PathBuf,

    /// Glob, relative to DIR, selecting the files to parse.
    #[arg(long, default_value = DEFAULT_SIMFILE_PATTERN)]
    pattern: String,

    /// Worker threads (defaults to one per core).
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Pretty-print the JSON.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // RUST_LOG overrides these.
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("smhash::parsing", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let paths = find_simfiles(&args.dir, &args.pattern)
        .with_context(|| format!("Invalid pattern '{}'", args.pattern))?;
    info!("Found {} simfile(s) in {:?}.", paths.len(), args.dir);

    let report = parse_all(&paths);

    let file = File::create(&args.out)
        .with_context(|| format!("Could not create {:?}", args.out))?;
    let mut writer = BufWriter::new(file);
    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &report.documents)?;
    } else {
        serde_json::to_writer(&mut writer, &report.documents)?;
    }
    writer.flush()?;

    info!("Wrote {} document(s) to {:?}.", report.documents.len(), args.out);
    Ok(())
}
