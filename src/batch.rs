//! Batch normalization of stored resource records.
//!
//! Every line of every `*.jsonl.gz` file under the input directory is mapped into form
//! state and written back out as its canonical save payload.

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::bounded;
use flate2::read::GzDecoder;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

use crate::entry::map_initial_resource;
use crate::form::FormLimits;
use crate::serialize::SavePayload;

pub const OUTPUT_FILE: &str = "normalized_resources.jsonl";

#[derive(Args)]
pub struct NormalizeArgs {
    /// Directory containing .jsonl.gz files of stored records
    #[arg(short, long)]
    pub input: PathBuf,

    /// Working directory for output files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of threads (0 = auto)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Records per batch
    #[arg(short, long, default_value = "5000")]
    pub batch_size: usize,

    #[command(flatten)]
    pub limits: FormLimits,
}

#[derive(Debug, Default)]
pub struct NormalizeStats {
    pub records: AtomicU64,
    pub skipped: AtomicU64,
    pub not_submit_ready: AtomicU64,
}

pub fn find_jsonl_gz_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let pattern = directory.as_ref().join("**/*.jsonl.gz");
    let pattern_str = pattern.to_string_lossy();
    Ok(glob(&pattern_str)?.filter_map(Result::ok).collect())
}

/// Maps one stored record line; `None` when the line is not a JSON object.
pub fn normalize_line(line: &str, limits: FormLimits) -> Option<(SavePayload, bool)> {
    let record: serde_json::Value = serde_json::from_str(line).ok()?;
    if !record.is_object() {
        return None;
    }
    let form = map_initial_resource(&record, limits);
    Some((form.to_payload(), form.is_submit_ready()))
}

fn process_file(
    filepath: &Path,
    limits: FormLimits,
    stats: &NormalizeStats,
    tx: &crossbeam_channel::Sender<Vec<SavePayload>>,
    batch_size: usize,
) -> Result<()> {
    let file = File::open(filepath)
        .with_context(|| format!("Failed to open {}", filepath.display()))?;
    let reader = BufReader::new(GzDecoder::new(file));

    let mut batch = Vec::with_capacity(batch_size);

    for line in reader.split(b'\n') {
        let Ok(line_str) = String::from_utf8(line?) else {
            debug!("Skipping non UTF-8 line in {}", filepath.display());
            stats.skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        if line_str.trim().is_empty() {
            continue;
        }

        let Some((payload, submit_ready)) = normalize_line(&line_str, limits) else {
            debug!("Skipping unparseable record in {}", filepath.display());
            stats.skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        };

        stats.records.fetch_add(1, Ordering::Relaxed);
        if !submit_ready {
            stats.not_submit_ready.fetch_add(1, Ordering::Relaxed);
        }
        batch.push(payload);

        if batch.len() >= batch_size && tx.send(std::mem::take(&mut batch)).is_err() {
            break;
        }
    }

    if !batch.is_empty() {
        let _ = tx.send(batch);
    }

    Ok(())
}

pub fn run(args: NormalizeArgs) -> Result<NormalizeStats> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("datacite_entries=info".parse()?),
        )
        .try_init()
        .ok();

    fs::create_dir_all(&args.output)?;

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok();
    info!("Using {} threads", num_threads);

    let stats = NormalizeStats::default();
    let files = find_jsonl_gz_files(&args.input)?;
    info!("Found {} files to process", files.len());
    if files.is_empty() {
        return Ok(stats);
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let (tx, rx) = bounded::<Vec<SavePayload>>(num_threads * 4);

    let output_path = args.output.join(OUTPUT_FILE);
    let writer_handle = std::thread::spawn(move || -> Result<()> {
        let file = File::create(&output_path)?;
        let mut writer = BufWriter::new(file);

        while let Ok(batch) = rx.recv() {
            for payload in batch {
                serde_json::to_writer(&mut writer, &payload)?;
                writer.write_all(b"\n")?;
            }
        }

        writer.flush()?;
        Ok(())
    });

    let limits = args.limits;
    files.par_iter().for_each_with(tx.clone(), |tx, filepath| {
        if let Err(e) = process_file(filepath, limits, &stats, tx, args.batch_size) {
            error!("Error processing {}: {}", filepath.display(), e);
        }
        progress.inc(1);
    });

    drop(tx);
    writer_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Writer thread panicked"))??;
    progress.finish();

    info!(
        "Normalized {} records ({} skipped, {} with a contact person lacking email)",
        stats.records.load(Ordering::Relaxed),
        stats.skipped.load(Ordering::Relaxed),
        stats.not_submit_ready.load(Ordering::Relaxed)
    );
    info!("Output: {}", args.output.display());

    Ok(stats)
}
