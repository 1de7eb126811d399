use clap::Parser;
use jsonselect::cli::{self, Args};
use std::io::{self, BufWriter};
use std::process::ExitCode;

/// Filters newline-delimited JSON from stdin through one or more selectors.
///
///     cat events.jsonl | jsonselect .event ".properties .os_name"
///     cat events.jsonl | jsonselect -s -q .event .properties
fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "jsonselect=debug"
    } else {
        "jsonselect=warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    match cli::run(&args, stdin.lock(), BufWriter::new(stdout.lock())) {
        Ok(outcome) if outcome.succeeded() => ExitCode::SUCCESS,
        Ok(outcome) => {
            log::error!("{} of {} lines failed", outcome.failed, outcome.lines);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
