//! Purpose: Hold top-level CLI command dispatch for `queryfmt`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: One query unit executes to completion before the next is built.
//! Invariants: A completed dump is emitted as a notice, never as an error.

use std::io::{BufRead, Write};
use std::path::Path;

use queryfmt::LogStore;
use queryfmt::notice::dump_notice;

use super::*;

pub(super) fn dispatch_command(command: Command, ctx: &RunContext) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "queryfmt", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Run { request, csv, out } => {
            let mut store = LogStore::open(&ctx.store_path)?;
            let mut query = Query::new(request.join(" "));
            query.execute(&mut store, ctx.timeout_ms);
            if query.result().is_none() {
                return Err(query_error(query));
            }

            render_result(&query, csv, ctx.color_mode)?;
            if let Some(out) = out {
                dump_last(&query, &out, "run", ctx.color_mode)?;
            }
            Ok(RunOutcome::ok())
        }
        Command::Shell => {
            let mut store = LogStore::open(&ctx.store_path)?;
            run_shell(&mut store, io::stdin().lock(), ctx)?;
            Ok(RunOutcome::ok())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ShellLine<'a> {
    Blank,
    Quit,
    Dump(&'a str),
    Render { csv: bool },
    Request(&'a str),
}

fn classify_shell_line(line: &str) -> ShellLine<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ShellLine::Blank,
        "quit" | "exit" => ShellLine::Quit,
        "json" => ShellLine::Render { csv: false },
        "csv" => ShellLine::Render { csv: true },
        _ => match trimmed.strip_prefix("dump ") {
            Some(path) => ShellLine::Dump(path.trim()),
            None => ShellLine::Request(line.trim_end_matches(['\r', '\n'])),
        },
    }
}

fn run_shell<R: BufRead>(store: &mut LogStore, reader: R, ctx: &RunContext) -> Result<(), Error> {
    let interactive = io::stdin().is_terminal();
    let mut last = Query::new("");
    let mut lines = reader.lines();
    loop {
        if interactive {
            eprint!("> ");
            let _ = io::stderr().flush();
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read request")
                .with_source(err)
        })?;

        match classify_shell_line(&line) {
            ShellLine::Blank => {}
            ShellLine::Quit => break,
            ShellLine::Dump(path) => {
                if let Err(err) = dump_last(&last, Path::new(path), "dump", ctx.color_mode) {
                    emit_error(&err, ctx.color_mode);
                }
            }
            ShellLine::Render { csv } => {
                if let Err(err) = render_result(&last, csv, ctx.color_mode) {
                    emit_error(&err, ctx.color_mode);
                }
            }
            ShellLine::Request(text) => {
                let mut query = Query::new(text);
                query.execute(store, ctx.timeout_ms);
                match query.error() {
                    Some(err) => emit_error(err, ctx.color_mode),
                    None => {
                        if let Err(err) = render_result(&query, false, ctx.color_mode) {
                            emit_error(&err, ctx.color_mode);
                        }
                    }
                }
                last = query;
            }
        }
    }
    Ok(())
}

fn render_result(query: &Query, csv: bool, color_mode: ColorMode) -> Result<(), Error> {
    if csv {
        emit_csv(&query.to_csv()?);
        return Ok(());
    }
    match query.result() {
        Some(value) => emit_value(value, color_mode),
        None => query.to_json().map(|_| ()),
    }
}

fn dump_last(query: &Query, path: &Path, cmd: &str, color_mode: ColorMode) -> Result<(), Error> {
    let receipt = query.dump_to_file(path)?;
    let notice = dump_notice(&receipt, cmd, notice_time_now().unwrap_or_default());
    emit_notice(&notice, color_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ShellLine, classify_shell_line};

    #[test]
    fn shell_lines_are_classified() {
        assert_eq!(classify_shell_line("   "), ShellLine::Blank);
        assert_eq!(classify_shell_line("exit"), ShellLine::Quit);
        assert_eq!(classify_shell_line(" quit "), ShellLine::Quit);
        assert_eq!(classify_shell_line("csv"), ShellLine::Render { csv: true });
        assert_eq!(classify_shell_line("json"), ShellLine::Render { csv: false });
        assert_eq!(
            classify_shell_line("dump  out.csv "),
            ShellLine::Dump("out.csv")
        );
        assert_eq!(
            classify_shell_line("import data.json"),
            ShellLine::Request("import data.json")
        );
        assert_eq!(classify_shell_line(" count"), ShellLine::Request(" count"));
    }
}
