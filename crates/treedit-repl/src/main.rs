use std::{
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use treedit_core::{
    init_tracing, init_tracing_to_file, CompileOptions, TreeditConfig, DEFAULT_SOURCE,
};
use treedit_repl::Repl;

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = config_from(&matches);

    match &config.log_file {
        Some(path) => init_tracing_to_file(path)?,
        None => init_tracing(),
    }

    let mut repl = Repl::new(&config, DEFAULT_SOURCE)?;

    if let Some(script) = matches.get_one::<String>("script") {
        let succeeded = repl.run_file(Path::new(script))?;
        if config.debug {
            println!("{succeeded} command(s) succeeded");
        }
        return Ok(());
    }

    println!("Treedit REPL v{}", treedit_core::VERSION);
    if config.debug {
        println!("Debug mode: enabled");
    }
    println!("Type .help for help, .quit to exit");
    println!();

    run_repl(&mut repl)
}

fn run_repl(repl: &mut Repl) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let is_interactive = io::stdin().is_terminal();

    repl.notifier().on_output(repl.editor().code());
    repl.notifier().on_output("");

    while repl.is_running() {
        match rl.readline("treedit> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line)?;

                // Echo input in non-interactive mode
                if !is_interactive {
                    println!(">> {trimmed}");
                }

                match repl.execute_line(trimmed) {
                    Ok(output) => repl.notifier().on_output(&output),
                    Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use .quit to exit");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}

fn cli() -> Command {
    Command::new("treedit-repl")
        .version(treedit_core::VERSION)
        .about("Interactive REPL for browsing and editing JavaScript syntax trees")
        .arg(
            Arg::new("script")
                .value_name("SCRIPT")
                .help("Run REPL commands from this file instead of reading stdin")
                .index(1),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .value_name("WIDTH")
                .help("Spaces per indentation level in the generated code")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write logs to this file instead of stderr"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(ArgAction::SetTrue),
        )
}

fn config_from(matches: &ArgMatches) -> TreeditConfig {
    TreeditConfig {
        compile: CompileOptions {
            indent_width: matches.get_one::<usize>("indent").copied().unwrap_or(2),
        },
        debug: matches.get_flag("debug"),
        log_file: matches.get_one::<String>("log-file").map(PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_is_not_configurable() {
        assert!(cli()
            .try_get_matches_from(["treedit-repl", "--source", "app.js"])
            .is_err());
    }

    #[test]
    fn test_script_and_defaults() {
        let matches = cli()
            .try_get_matches_from(["treedit-repl", "edits.treedit"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("script").map(String::as_str),
            Some("edits.treedit")
        );
        let config = config_from(&matches);
        assert_eq!(config.compile.indent_width, 2);
        assert_eq!(config.log_file, None);
    }
}
