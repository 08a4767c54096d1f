use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cmdline_core::tokenize::tokenize_unix;
use cmdline_core::{ArgRequirement, Formatting, OptionEntry};
use cmdline_decl::{Document, ParseReport};
use serde::Serialize;
use tracing::{Level, debug, info};

/// Output format for reports and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "cmdline-check", version)]
#[command(about = "Check argument vectors against declarative option documents")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one argument vector and print the report.
    Parse(ParseArgs),
    /// Parse every line of a file as an independent argument vector.
    Batch(BatchArgs),
    /// List the options a declaration accepts.
    Options(OptionsArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Declaration document (YAML or JSON, `-` for stdin).
    #[arg(long)]
    decl: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments to parse. Put them after `--` if they start with a dash.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Declaration document (YAML or JSON, `-` for stdin).
    #[arg(long)]
    decl: PathBuf,
    /// File with one argument vector per line, split with shell quoting rules.
    #[arg(long)]
    input: PathBuf,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct OptionsArgs {
    /// Declaration document (YAML or JSON, `-` for stdin).
    #[arg(long)]
    decl: PathBuf,
    /// Include hidden options.
    #[arg(long)]
    all: bool,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
}

/// Exit status: parse failure.
const EXIT_PARSE_FAILURE: u8 = 1;
/// Exit status: bad usage, unreadable or invalid input files.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Batch(args) => run_batch(args),
        Command::Options(args) => run_options(args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_PARSE_FAILURE),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_document(path: &Path) -> Result<Document, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("Failed to read declaration from stdin: {e}"))?;
        return Document::from_str_detect(&text)
            .map_err(|e| format!("Failed to load declaration from stdin: {e}"));
    }

    Document::load(path)
        .map_err(|e| format!("Failed to load declaration '{}': {e}", path.display()))
}

fn render<T: Serialize>(
    value: &T,
    format: CliOutputFormat,
    text: impl FnOnce() -> String,
) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        CliOutputFormat::Text => Ok(text()),
    }
}

// ---------------------------------------------------------------------------
// parse command
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs) -> Result<bool, String> {
    let doc = load_document(&args.decl)?;
    let mut decl = doc
        .build()
        .map_err(|e| format!("Invalid declaration '{}': {e}", args.decl.display()))?;

    info!(args = args.args.len(), "Parsing argument vector");
    let report = decl.expand_and_parse(args.args);

    let out = render(&report, args.format, || report.to_string())?;
    print_block(&out);
    Ok(report.success)
}

// ---------------------------------------------------------------------------
// batch command
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BatchEntry {
    line: usize,
    args: Vec<String>,
    report: ParseReport,
}

fn run_batch(args: BatchArgs) -> Result<bool, String> {
    use rayon::prelude::*;

    let doc = load_document(&args.decl)?;
    // Fail on a broken declaration before spawning any work.
    doc.build()
        .map_err(|e| format!("Invalid declaration '{}': {e}", args.decl.display()))?;

    let input = fs::read_to_string(&args.input)
        .map_err(|e| format!("Failed to read input '{}': {e}", args.input.display()))?;

    let sessions: Vec<(usize, Vec<String>)> = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, tokenize_unix(line)))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    info!(
        sessions = sessions.len(),
        threads = pool.current_num_threads(),
        "Parsing batch"
    );

    let entries: Vec<BatchEntry> = pool.install(|| {
        sessions
            .into_par_iter()
            .map(|(line, argv)| {
                let mut decl = doc
                    .build()
                    .map_err(|e| format!("Invalid declaration: {e}"))?;
                let report = decl.expand_and_parse(argv.iter().cloned());
                debug!(line, success = report.success, "Parsed batch line");
                Ok(BatchEntry {
                    line,
                    args: argv,
                    report,
                })
            })
            .collect::<Result<Vec<_>, String>>()
    })?;

    let failed = entries.iter().filter(|e| !e.report.success).count();
    let out = render(&entries, args.format, || batch_text(&entries))?;
    print_block(&out);

    if failed > 0 {
        eprintln!("{failed} of {} argument vectors failed", entries.len());
    }
    Ok(failed == 0)
}

fn batch_text(entries: &[BatchEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let status = if entry.report.success { "ok" } else { "failed" };
        out.push_str(&format!("line {}: {status}\n", entry.line));
        for err in &entry.report.errors {
            out.push_str(&format!("  error: {err}\n"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// options command
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OptionListing {
    usage: String,
    aliases: Vec<String>,
    #[serde(flatten)]
    info: cmdline_core::OptionInfo,
}

fn run_options(args: OptionsArgs) -> Result<bool, String> {
    let doc = load_document(&args.decl)?;
    let decl = doc
        .build()
        .map_err(|e| format!("Invalid declaration '{}': {e}", args.decl.display()))?;

    let listings: Vec<OptionListing> = decl
        .cmd()
        .options()
        .iter()
        .filter(|entry| args.all || !entry.is_hidden())
        .map(|entry| OptionListing {
            usage: usage(entry),
            aliases: entry.aliases(),
            info: entry.info().clone(),
        })
        .collect();

    let out = render(&listings, args.format, || options_text(&listings))?;
    print_block(&out);
    Ok(true)
}

fn options_text(listings: &[OptionListing]) -> String {
    let width = listings
        .iter()
        .map(|l| l.usage.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for listing in listings {
        let mut line = format!("  {:<width$}", listing.usage);
        if !listing.info.desc.is_empty() {
            line.push_str("  ");
            line.push_str(&listing.info.desc);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Spells every alias of an option the way it is written on a command line.
fn usage(entry: &OptionEntry) -> String {
    let info = entry.info();
    let repeat = if entry.is_unbounded() { "..." } else { "" };

    if info.formatting == Formatting::Positional {
        return format!("<{}>{repeat}", entry.display_name());
    }

    let prefix = matches!(info.formatting, Formatting::Prefix | Formatting::MayPrefix);
    let value = match (info.arg, prefix) {
        (ArgRequirement::Disallowed, _) => String::new(),
        (ArgRequirement::Required, true) => format!("<{}>", info.arg_name),
        (ArgRequirement::Required, false) => format!(" <{}>", info.arg_name),
        (ArgRequirement::Optional, true) => format!("[<{}>]", info.arg_name),
        (ArgRequirement::Optional, false) => format!("[=<{}>]", info.arg_name),
    };

    entry
        .aliases()
        .iter()
        .map(|alias| {
            let dashes = if alias.chars().count() == 1 { "-" } else { "--" };
            format!("{dashes}{alias}{value}{repeat}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_block(out: &str) {
    if out.ends_with('\n') {
        print!("{out}");
    } else {
        println!("{out}");
    }
}
