use std::fs::{self, File};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use kusari::cli::{self, CliArgs, ScriptInput};
use kusari::interp::Interp;
use kusari::message::{Code, FatalKind, Message};
use kusari::source::{FileSource, MemorySource, ScriptSource, SourceError};
use kusari::stmt::Role;

const USAGE: &str = "\
Usage: kusari [<script> | -] [options]

  -c <statement>   run a statement before the script (repeatable)
  -l <file>        write the event report to <file>
  -q               suppress the banner
  -v               print the version and exit
  -h               print this help and exit
";

// ── Entry ────────────────────────────────────────────────────────────────────

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("kusari: {e}");
            eprint!("{USAGE}");
            std::process::exit(1);
        }
    };

    if args.show_help {
        print!("{USAGE}");
        return;
    }
    if args.show_version {
        println!("kusari {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let mut interp = Interp::new();
    let interactive = args.input == ScriptInput::Interactive
        && args.commands.is_empty()
        && io::stdin().is_terminal();

    let code = if interactive {
        run_repl(&mut interp, &args)
    } else {
        run_batch(&mut interp, &args)
    };
    std::process::exit(code);
}

fn drain_output(interp: &mut Interp) {
    for line in interp.take_output() {
        println!("{line}");
    }
}

fn report_fatal(m: &Message) {
    let kind = m.fatal_kind().unwrap_or(FatalKind::Generic);
    println!("fatal({kind}): {}", m.detail);
}

// ── Interactive loop ─────────────────────────────────────────────────────────

/// Statements are buffered until every opened region is closed, so `if`,
/// `while`, `for`, and `def` bodies can be typed across prompts. A parse
/// fatal or Ctrl-C discards the buffer.
fn run_repl(interp: &mut Interp, args: &CliArgs) -> i32 {
    if !args.quiet {
        println!("kusari {}", env!("CARGO_PKG_VERSION"));
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("kusari: cannot start line editor: {err}");
            return 1;
        }
    };
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    let mut buffer: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut code = 0;
    loop {
        let prompt = if buffer.is_empty() { "> " } else { "| " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                depth = 0;
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("kusari: {err}");
                code = 1;
                break;
            }
        };
        if buffer.is_empty() && line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        match interp.statement(&line) {
            Ok(stmt) => match stmt.role() {
                Role::Opener | Role::Definition => depth += 1,
                Role::Closer => depth = depth.saturating_sub(1),
                _ => {}
            },
            Err(m) => {
                report_fatal(&m);
                buffer.clear();
                depth = 0;
                continue;
            }
        }
        buffer.push(line);
        if depth > 0 {
            continue;
        }

        let text = buffer.join("\n");
        buffer.clear();
        let m = interp.exec_line(&text);
        drain_output(interp);
        match m.code {
            Code::Quit => break,
            Code::Fatal(_) => report_fatal(&m),
            _ => {}
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = editor.save_history(path);
    }
    code
}

fn history_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "kusari")?;
    Some(dirs.data_dir().join("history.txt"))
}

// ── Batch ────────────────────────────────────────────────────────────────────

/// `-c` statements run first, then the script, as separate runs against one
/// interpreter. A fatal or a `quit` in either stops the rest.
fn run_batch(interp: &mut Interp, args: &CliArgs) -> i32 {
    let mut failed = false;
    let mut quit = false;

    for text in &args.commands {
        let m = interp.exec_line(text);
        drain_output(interp);
        match m.code {
            Code::Quit => {
                quit = true;
                break;
            }
            Code::Fatal(_) => {
                failed = true;
                break;
            }
            _ => {}
        }
    }

    if !failed && !quit {
        let script = match open_script(args) {
            Ok(script) => script,
            Err(err) => {
                eprintln!("kusari: {err}");
                return 1;
            }
        };
        if let Some(mut source) = script {
            match interp.exec_source(source.as_mut()) {
                Ok(m) => {
                    drain_output(interp);
                    if m.is_fatal() {
                        failed = true;
                    }
                }
                Err(err) => {
                    drain_output(interp);
                    eprintln!("kusari: {err}");
                    failed = true;
                }
            }
        }
    }

    if let Err(err) = write_report(interp, args) {
        eprintln!("kusari: cannot write report: {err}");
        return 1;
    }
    if failed {
        1
    } else {
        0
    }
}

/// Pick the script source for a batch run. With `-c` and no script argument
/// there is nothing further to read.
fn open_script(args: &CliArgs) -> Result<Option<Box<dyn ScriptSource>>, SourceError> {
    match &args.input {
        ScriptInput::File(path) => Ok(Some(Box::new(FileSource::open(path)?))),
        ScriptInput::Stdin => Ok(Some(Box::new(stdin_source()?))),
        ScriptInput::Interactive => {
            if args.commands.is_empty() {
                Ok(Some(Box::new(stdin_source()?)))
            } else {
                Ok(None)
            }
        }
    }
}

fn stdin_source() -> Result<MemorySource, SourceError> {
    let text = io::read_to_string(io::stdin())?;
    Ok(MemorySource::new(&text))
}

fn write_report(interp: &Interp, args: &CliArgs) -> io::Result<()> {
    if let Some(path) = &args.log_file {
        let mut file = File::create(path)?;
        interp.tracker().write_report(&mut file)
    } else if !interp.tracker().is_empty() {
        interp.tracker().write_report(&mut io::stderr())
    } else {
        Ok(())
    }
}
