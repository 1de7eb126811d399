//! The line-oriented filter behind the `jsonselect` binary.
//!
//! Every non-blank input line is decoded as one JSON document and every
//! selector is applied to it in turn. All results for a line are written as
//! one group, separated by newlines or, with `--single-line`, by tabs.
use clap::Parser;
use jsonselect_selector::{
    DiagnosticSink, LogSink, NoopSink, SelectError, Selector, compile, parse_document,
};
use serde_json::Value;
use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Apply JSON selectors to newline-delimited JSON read from stdin"
)]
pub struct Args {
    /// Put all results for one input line on a single, tab-separated line
    #[arg(short, long, default_value_t = false)]
    pub single_line: bool,

    /// Keep strings quoted instead of printing their raw text
    #[arg(short, long, default_value_t = false)]
    pub quote: bool,

    /// Pretty-print JSON results
    #[arg(short, long, default_value_t = false)]
    pub indent: bool,

    /// Log query diagnostics at debug level
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Selectors applied to every input line
    #[arg(value_name = "SELECTOR", default_value = ":root")]
    pub selectors: Vec<String>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: SelectError,
    },

    #[error("Query failed: {0}")]
    Query(#[from] SelectError),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Counts of processed and failed input lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub lines: usize,
    pub failed: usize,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Parses every selector up front so a typo fails before any input is read.
pub fn parse_selectors(patterns: &[String]) -> Result<Vec<Selector>, CliError> {
    patterns
        .iter()
        .map(|pattern| {
            Selector::parse(pattern).map_err(|source| CliError::InvalidSelector {
                selector: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Filters `input` into `output`.
///
/// A line that fails to decode, evaluate or serialize is logged and skipped;
/// processing continues and the failure is counted in the returned
/// [`Outcome`]. Only I/O failures and invalid selectors abort the run.
pub fn run<R: BufRead, W: Write>(args: &Args, input: R, mut output: W) -> Result<Outcome, CliError> {
    let selectors = parse_selectors(&args.selectors)?;
    let sink: &dyn DiagnosticSink = if args.verbose { &LogSink } else { &NoopSink };
    let separator = if args.single_line { "\t" } else { "\n" };

    let mut outcome = Outcome::default();
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        outcome.lines += 1;

        match render_line(args, &selectors, &line, sink) {
            Ok(results) => {
                output.write_all(results.join(separator).as_bytes())?;
                output.write_all(b"\n")?;
            }
            Err(e) => {
                log::error!("Line {}: {}", number + 1, e);
                outcome.failed += 1;
            }
        }
    }
    output.flush()?;

    log::debug!(
        "Processed {} lines, {} failed",
        outcome.lines,
        outcome.failed
    );
    Ok(outcome)
}

fn render_line(
    args: &Args,
    selectors: &[Selector],
    line: &str,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<String>, CliError> {
    let document = parse_document(line)?;
    let index = compile(&document);
    let mut results = Vec::new();
    for selector in selectors {
        for value in index.select_compiled(selector, sink)? {
            results.push(render_value(value, args)?);
        }
    }
    Ok(results)
}

/// Strings print as raw text unless `--quote` is set; everything else is JSON.
pub fn render_value(value: &Value, args: &Args) -> Result<String, serde_json::Error> {
    match value {
        Value::String(text) if !args.quote => Ok(text.clone()),
        _ if args.indent => serde_json::to_string_pretty(value),
        _ => serde_json::to_string(value),
    }
}
