//! Interactive formula checker.
//!
//! Reads one formula per line from stdin and reports the ones that fail to parse. Diagnostics go
//! to the log (stderr); stdout only carries the prompt, the failure notice and, with `--json`,
//! machine-readable reports.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use formula_syntax::{lex, parse_bytes_with_options, Diagnostic, ParseOptions};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "Enter formula or (quit)";

#[derive(Debug, Parser)]
#[command(name = "formula-calc", about = "Parse spreadsheet formulas read from stdin")]
struct Cli {
    /// Increase logging verbosity (-v: info, -vv: debug, -vvv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log every grammar production the parser enters (implies -vvv).
    #[arg(long)]
    trace: bool,

    /// Log every scanned token (implies -v).
    #[arg(long)]
    tokens: bool,

    /// Print the diagnostics of each failing formula as a JSON object.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn verbosity(&self) -> u8 {
        let mut v = self.verbose;
        if self.tokens {
            v = v.max(1);
        }
        if self.trace {
            v = v.max(3);
        }
        v
    }
}

#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    input: &'a str,
    diagnostics: &'a [Diagnostic],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbosity()))),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&cli, stdin.lock(), stdout.lock())
}

fn directive_for_verbosity(v: u8) -> &'static str {
    // Targets are crate module paths: the binary logs as `formula_calc`.
    match v {
        0 => "formula_calc=warn,formula_syntax=warn",
        1 => "formula_calc=info,formula_syntax=info",
        2 => "formula_calc=debug,formula_syntax=debug",
        _ => "formula_calc=trace,formula_syntax=trace",
    }
}

/// Prompts for and checks formulas until a `quit` line or end of input.
fn run(cli: &Cli, mut input: impl BufRead, mut out: impl Write) -> Result<()> {
    let opts = ParseOptions { trace: cli.trace };
    let mut buf = Vec::new();
    let mut failures = 0usize;

    loop {
        writeln!(out, "{PROMPT}")?;
        out.flush()?;

        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .context("failed to read formula from stdin")?;
        if read == 0 {
            break;
        }
        let line = trim_line_ending(&buf);
        if line == b"quit" {
            break;
        }
        if !check_formula(cli, &opts, line, &mut out)? {
            failures += 1;
        }
    }

    log::info!("done ({failures} formula(s) failed to parse)");
    Ok(())
}

/// Parses `line`, printing the failure notice when it has diagnostics. Returns whether it parsed
/// cleanly.
fn check_formula(
    cli: &Cli,
    opts: &ParseOptions,
    line: &[u8],
    out: &mut impl Write,
) -> Result<bool> {
    if cli.tokens {
        for lexeme in lex(line).tokens {
            log::info!("{} {} {}", lexeme.pos, lexeme.token, lexeme.literal);
        }
    }

    let parsed = parse_bytes_with_options(line, opts);
    let text = String::from_utf8_lossy(line);
    let Some(err) = &parsed.error else {
        log::debug!("parsed {text:?}");
        return Ok(true);
    };

    writeln!(out, "Error parsing \"{text}\"")?;
    for diag in err.diagnostics() {
        log::debug!("{}: {}", diag.position(line), diag.message);
    }
    if cli.json {
        let report = FailureReport {
            input: &text,
            diagnostics: err.diagnostics(),
        };
        serde_json::to_writer(&mut *out, &report).context("failed to encode diagnostics")?;
        writeln!(out)?;
    }
    Ok(false)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
