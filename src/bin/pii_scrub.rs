// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pii-scrub`: pseudonymize a JSON-lines stream of enriched events.
//!
//! Exit status: 0 when every event was written, 1 when some lines were rejected,
//! 2 when the configuration is invalid.

use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use eventflux_pii::core::event::EnrichedEvent;
use eventflux_pii::core::pii::{MutatorRegistry, PiiPseudonymizer};
use eventflux_pii::PiiError;

#[derive(Parser)]
#[command(name = "pii-scrub")]
#[command(about = "Pseudonymize PII in JSON-lines enriched events", long_about = None)]
#[command(version)]
struct Cli {
    /// PII enrichment configuration (.json, .yaml/.yml or .toml)
    #[arg(short, long)]
    config: PathBuf,
    /// Events to read, one JSON object per line. Default: stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Where scrubbed events are written. Default: stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Where identification events are written, when the configuration emits them
    #[arg(long)]
    identification_out: Option<PathBuf>,
    /// Transform each batch on all cores
    #[arg(long)]
    parallel: bool,
    /// Lines held in memory at once
    #[arg(long, default_value_t = 1024)]
    batch_size: usize,
}

enum Outcome {
    Scrubbed {
        event: EnrichedEvent,
        identification: Option<JsonValue>,
    },
    Rejected {
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    written: usize,
    rejected: usize,
}

impl Summary {
    fn exit_code(&self) -> i32 {
        if self.rejected > 0 {
            1
        } else {
            0
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let registry = MutatorRegistry::<EnrichedEvent>::enriched_event();
    let enrichment = match PiiPseudonymizer::from_file(&cli.config, &registry) {
        Ok(enrichment) => enrichment,
        Err(e) => {
            report_config_error(&e);
            std::process::exit(2);
        }
    };

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut identification_out: Option<Box<dyn Write>> = match &cli.identification_out {
        Some(path) => Some(Box::new(BufWriter::new(File::create(path)?))),
        None => None,
    };

    let summary = scrub_stream(
        &enrichment,
        reader,
        &mut output,
        identification_out.as_mut().map(|out| &mut **out as &mut dyn Write),
        cli.batch_size,
        cli.parallel,
    )?;
    output.flush()?;
    if let Some(out) = identification_out.as_mut() {
        out.flush()?;
    }

    info!(
        "[pii-scrub] {} event(s) written, {} rejected",
        summary.written, summary.rejected
    );
    if summary.rejected > 0 {
        std::process::exit(summary.exit_code());
    }
    Ok(())
}

/// Transform `reader` batch by batch, writing each batch before reading the next
fn scrub_stream(
    enrichment: &PiiPseudonymizer<EnrichedEvent>,
    reader: impl BufRead,
    output: &mut dyn Write,
    mut identification_out: Option<&mut dyn Write>,
    batch_size: usize,
    parallel: bool,
) -> io::Result<Summary> {
    let batch_size = batch_size.max(1);
    let mut lines = reader.lines().enumerate();
    let mut batch: Vec<(usize, String)> = Vec::with_capacity(batch_size);
    let mut summary = Summary::default();

    loop {
        batch.clear();
        for (idx, line) in lines.by_ref() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            batch.push((idx + 1, line));
            if batch.len() == batch_size {
                break;
            }
        }
        if batch.is_empty() {
            return Ok(summary);
        }

        let outcomes: Vec<Outcome> = if parallel {
            batch
                .par_iter()
                .map(|(line, raw)| process(enrichment, *line, raw))
                .collect()
        } else {
            batch
                .iter()
                .map(|(line, raw)| process(enrichment, *line, raw))
                .collect()
        };

        for outcome in outcomes {
            match outcome {
                Outcome::Scrubbed {
                    event,
                    identification,
                } => {
                    serde_json::to_writer(&mut *output, &event)?;
                    writeln!(output)?;
                    if let (Some(out), Some(document)) =
                        (identification_out.as_deref_mut(), identification)
                    {
                        serde_json::to_writer(&mut *out, &document)?;
                        writeln!(out)?;
                    }
                    summary.written += 1;
                }
                Outcome::Rejected { line, reason } => {
                    eprintln!("line {}: {}", line, reason);
                    summary.rejected += 1;
                }
            }
        }
    }
}

fn process(enrichment: &PiiPseudonymizer<EnrichedEvent>, line: usize, raw: &str) -> Outcome {
    let mut event: EnrichedEvent = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            return Outcome::Rejected {
                line,
                reason: format!("not an event: {}", e),
            }
        }
    };
    match enrichment.transform(&mut event) {
        Ok(()) => Outcome::Scrubbed {
            identification: enrichment.identification_event(&event),
            event,
        },
        Err(e) => {
            warn!(
                "[pii-scrub] Rejecting line {} (field {}): {}",
                line,
                e.event_field().unwrap_or("-"),
                e
            );
            Outcome::Rejected {
                line,
                reason: e.to_string(),
            }
        }
    }
}

fn report_config_error(error: &PiiError) {
    match error.problems() {
        [] => eprintln!("error: {}", error),
        problems => {
            eprintln!("error: invalid PII configuration in {} place(s):", problems.len());
            for problem in problems {
                eprintln!("  - {}", problem);
            }
        }
    }
}
