//! Purpose: `queryfmt` CLI entry point.
//! Role: Binary crate root; parses args, installs logging, runs commands.
//! Invariants: Results go to stdout; errors and notices go to stderr.
//! Invariants: Non-interactive errors and notices are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

mod color_json;
mod command_dispatch;

use color_json::colorize_json;
use queryfmt::notice::{Notice, notice_json};
use queryfmt::store::default_store_path;
use queryfmt::{Error, ErrorKind, Query, Value, to_exit_code};

const DEFAULT_TIMEOUT_MS: u16 = 5000;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

#[derive(Clone, Debug)]
struct RunContext {
    store_path: PathBuf,
    timeout_ms: u16,
    color_mode: ColorMode,
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let ctx = RunContext {
        store_path: cli.store.unwrap_or_else(default_store_path),
        timeout_ms: cli.timeout,
        color_mode: cli.color,
    };
    let color_mode = ctx.color_mode;

    command_dispatch::dispatch_command(cli.command, &ctx)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "queryfmt",
    version,
    about = "Dispatch requests to a store and render results as JSON or CSV",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A request is either `import <file>` (.json or .csv) or query text passed to the store.

Mental model:
  - `run` executes one request and prints its result
  - `shell` reads requests line by line and can dump the last result
"#,
    after_help = r#"EXAMPLES
  $ queryfmt run 'import people.csv'
  $ queryfmt run last
  $ queryfmt run --csv --out people-copy.csv last

LEARN MORE
  $ queryfmt <command> --help"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "Store file (default: ~/.queryfmt/store.jsonl)",
        value_hint = ValueHint::FilePath
    )]
    store: Option<PathBuf>,
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_MS,
        help = "Store call timeout in milliseconds (0 = no deadline)"
    )]
    timeout: u16,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Execute one request",
        long_about = r#"Execute one request against the store and print the result.

`import <path>` loads a .json or .csv file and inserts it; any other text is sent
to the store as a query, unchanged."#,
        after_help = r#"EXAMPLES
  $ queryfmt run 'import data.json'
  $ queryfmt run all
  $ queryfmt run --csv 3
  $ queryfmt run --out last.json last

NOTES
  - Store selectors: last | all | count | <seq>
  - `--out` picks JSON or CSV from the file extension"#
    )]
    Run {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            help = "Request text (words are joined with single spaces)"
        )]
        request: Vec<String>,
        #[arg(long, help = "Print the result as CSV instead of JSON")]
        csv: bool,
        #[arg(
            long,
            help = "Also write the result to this .json or .csv file",
            value_hint = ValueHint::FilePath
        )]
        out: Option<PathBuf>,
    },
    #[command(
        about = "Read requests from stdin, one per line",
        long_about = r#"Read requests from stdin, one per line, and print each result.

Session commands:
  dump <path>   write the last result to a .json or .csv file
  json | csv    print the last result again in that format
  quit | exit   end the session"#,
        after_help = r#"EXAMPLES
  $ queryfmt shell
  > import people.csv
  > all
  > dump everyone.json"#
    )]
    Shell,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout."#,
        after_help = r#"EXAMPLES
  $ queryfmt completion bash > ~/.local/share/bash-completion/completions/queryfmt
  $ queryfmt completion zsh > ~/.zfunc/_queryfmt"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

/// Turns a resolved unit into its error, if it failed.
fn query_error(query: Query) -> Error {
    query
        .into_outcome()
        .and_then(Result::err)
        .unwrap_or_else(|| Error::new(ErrorKind::Internal).with_message("request did not resolve"))
}

fn emit_value(value: &Value, color_mode: ColorMode) -> Result<(), Error> {
    let is_tty = io::stdout().is_terminal();
    println!("{}", value_text(value, is_tty, color_mode)?);
    Ok(())
}

// Piped output stays compact and plain whatever the color mode.
fn value_text(value: &Value, is_tty: bool, color_mode: ColorMode) -> Result<String, Error> {
    if is_tty {
        Ok(colorize_json(value, color_mode.use_color(is_tty)))
    } else {
        queryfmt::json::encode_json(value)
    }
}

fn emit_csv(text: &str) {
    print!("{text}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::UnsupportedFormat => "unsupported file format".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::MalformedInput => "malformed input".to_string(),
        ErrorKind::EmptyInput => "empty input".to_string(),
        ErrorKind::RowShapeMismatch => "row does not match header".to_string(),
        ErrorKind::NotTabular => "value is not tabular".to_string(),
        ErrorKind::NotConvertible => "value cannot be converted".to_string(),
        ErrorKind::EmptyResult => "no result".to_string(),
        ErrorKind::Decode => "decode failed".to_string(),
        ErrorKind::Timeout => "deadline exceeded".to_string(),
        ErrorKind::Store => "store error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> JsonValue {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), JsonValue::Object(inner));
    JsonValue::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() || err.kind() != ErrorKind::Io {
        return err;
    }
    err.with_hint("I/O error. Check the path, permissions, and disk space.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `queryfmt --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "queryfmt") else {
        return "Try `queryfmt --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `queryfmt --help`.".to_string();
    }
    format!("Try `queryfmt {} --help`.", parts.join(" "))
}
