use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use treedit_core::browser::{ui, App};
use treedit_core::{init_tracing_to_file, CompileOptions, TreeditConfig, DEFAULT_SOURCE};

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = config_from(&matches);

    if let Some(path) = &config.log_file {
        init_tracing_to_file(path)?;
    }

    let start = Instant::now();
    let mut app = App::new(&config, DEFAULT_SOURCE)?;
    info!("Loaded tree and compiled in {:?}", start.elapsed());

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err}");
    }
    if config.debug {
        println!("{}", app.editor.code());
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.quit {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

fn cli() -> Command {
    Command::new("treedit-browser")
        .version(treedit_core::VERSION)
        .about("Browse and edit a JavaScript syntax tree in the terminal")
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
                .help("Write logs to this file")
                .default_value("treedit-browser.log"),
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
            .try_get_matches_from(["treedit-browser", "app.js"])
            .is_err());
    }

    #[test]
    fn test_config_from_args() {
        let matches = cli()
            .try_get_matches_from(["treedit-browser", "--indent", "4", "--debug"])
            .unwrap();
        let config = config_from(&matches);
        assert_eq!(config.compile.indent_width, 4);
        assert!(config.debug);
        assert_eq!(config.log_file, Some(PathBuf::from("treedit-browser.log")));
    }
}
