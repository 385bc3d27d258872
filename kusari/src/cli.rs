//! Command-line argument parsing.
//!
//! Usage:
//!   kusari [-c<stmt>] [-l<file>] [-qvh] [<file> | -]

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// What to run after any `-c` statements.
    pub input: ScriptInput,
    /// Statements to execute first (`-c<stmt>`, repeatable, in order).
    pub commands: Vec<String>,
    /// Event report destination (`-l<file>`); stderr when absent.
    pub log_file: Option<PathBuf>,
    /// Suppress the banner (`-q`).
    pub quiet: bool,
    /// Print the version and exit (`-v`).
    pub show_version: bool,
    /// Print usage and exit (`-h`).
    pub show_help: bool,
}

/// Where the script comes from.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum ScriptInput {
    /// No positional argument: interactive session.
    #[default]
    Interactive,
    /// Run this script file.
    File(PathBuf),
    /// `-`: read the script from stdin.
    Stdin,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument; a lone `-` is the stdin marker.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'q' => args.quiet = true,
                'v' => args.show_version = true,
                'h' => args.show_help = true,

                // -c<stmt>
                'c' => {
                    let stmt = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a statement argument".to_owned());
                    };
                    args.commands.push(stmt);
                }

                // -l<file>
                'l' => {
                    let file = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-l requires a file argument".to_owned());
                    };
                    args.log_file = Some(PathBuf::from(file));
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    // Positional argument → script input.
    match positional.len() {
        0 => {}
        1 => {
            args.input = if positional[0] == "-" {
                ScriptInput::Stdin
            } else {
                ScriptInput::File(PathBuf::from(positional.remove(0)))
            };
        }
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert_eq!(a.input, ScriptInput::Interactive);
        assert!(a.commands.is_empty());
        assert!(a.log_file.is_none());
        assert!(!a.quiet && !a.show_version && !a.show_help);
    }

    #[test]
    fn file_positional() {
        let a = parse_argv(&argv(&["setup.ks"])).unwrap();
        assert_eq!(a.input, ScriptInput::File(PathBuf::from("setup.ks")));
    }

    #[test]
    fn stdin_marker() {
        let a = parse_argv(&argv(&["-"])).unwrap();
        assert_eq!(a.input, ScriptInput::Stdin);
    }

    #[test]
    fn bool_flags_combined() {
        let a = parse_argv(&argv(&["-qv"])).unwrap();
        assert!(a.quiet && a.show_version);
        let a = parse_argv(&argv(&["-h"])).unwrap();
        assert!(a.show_help);
    }

    #[test]
    fn command_embedded() {
        let a = parse_argv(&argv(&["-cprint(1)"])).unwrap();
        assert_eq!(a.commands, vec!["print(1)"]);
    }

    #[test]
    fn command_separate() {
        let a = parse_argv(&argv(&["-c", "var x = 1"])).unwrap();
        assert_eq!(a.commands, vec!["var x = 1"]);
    }

    #[test]
    fn commands_accumulate_in_order() {
        let a = parse_argv(&argv(&["-c", "var x = 1", "-cprint(x)"])).unwrap();
        assert_eq!(a.commands, vec!["var x = 1", "print(x)"]);
    }

    #[test]
    fn command_missing_argument() {
        assert!(parse_argv(&argv(&["-c"])).is_err());
    }

    #[test]
    fn log_file_embedded_and_separate() {
        let a = parse_argv(&argv(&["-levent.log"])).unwrap();
        assert_eq!(a.log_file, Some(PathBuf::from("event.log")));
        let a = parse_argv(&argv(&["-l", "event.log"])).unwrap();
        assert_eq!(a.log_file, Some(PathBuf::from("event.log")));
    }

    #[test]
    fn flag_and_script_together() {
        let a = parse_argv(&argv(&["-q", "-c", "nop()", "run.ks"])).unwrap();
        assert!(a.quiet);
        assert_eq!(a.commands, vec!["nop()"]);
        assert_eq!(a.input, ScriptInput::File(PathBuf::from("run.ks")));
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-weird-name"])).unwrap();
        assert_eq!(a.input, ScriptInput::File(PathBuf::from("-weird-name")));
    }

    #[test]
    fn unknown_option() {
        let err = parse_argv(&argv(&["-x"])).unwrap_err();
        assert!(err.contains("unknown option"));
    }

    #[test]
    fn too_many_positionals() {
        assert!(parse_argv(&argv(&["a.ks", "b.ks"])).is_err());
    }
}
