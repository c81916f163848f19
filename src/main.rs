mod cache;
mod config;
mod editor;
mod error;
mod event;
mod exec;
mod highlight;
mod remote;
mod repo;
mod session;
mod shell;
mod tui;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use crossterm::style::Stylize;

use crate::cache::ContentCache;
use crate::config::{AppConfig, DisplayConfig, GeneralConfig};
use crate::editor::{EditorAction, LineEditor};
use crate::event::InputHandler;
use crate::highlight::Highlighter;
use crate::remote::GitHubClient;
use crate::repo::TreeNode;
use crate::session::{parse_owner_repo, RepoSpec, SessionState};
use crate::shell::{Flow, Shell};
use crate::tui::{install_panic_hook, RawTerminal};

/// Browse a remote GitHub repository from an interactive shell.
#[derive(Parser, Debug)]
#[command(name = "ghc", version, about)]
struct Cli {
    /// Repository to browse, as <owner>/<repo>
    #[arg(short = 'i', long = "init", value_name = "OWNER/REPO", value_parser = repo_arg)]
    init: String,

    /// Branch to browse (defaults to `master` or the configured branch)
    #[arg(short, long)]
    branch: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory under which the local cache is created
    #[arg(long)]
    cache_root: Option<PathBuf>,

    /// Print file content without syntax highlighting
    #[arg(long)]
    no_highlight: bool,
}

fn repo_arg(value: &str) -> Result<String, String> {
    parse_owner_repo(value).map(|_| value.trim().to_string())
}

impl Cli {
    /// Config values given on the command line.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                cache_root: self
                    .cache_root
                    .as_ref()
                    .map(|p| p.display().to_string()),
                default_branch: self.branch.clone(),
            },
            display: DisplayConfig {
                highlight: self.no_highlight.then_some(false),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let spec = RepoSpec::parse(&cli.init, config.default_branch())?;
    let mut stdout = io::stdout();

    print!("Initializing {}... ", spec.label());
    stdout.flush()?;
    let (client, tree) = finish_step(&mut stdout, load_tree(&spec, &config).await)?;
    let (dirs, files) = tree.count();
    log::info!("{} directories, {} files", dirs, files);

    print!("Initializing local cache... ");
    stdout.flush()?;
    let session = finish_step(&mut stdout, SessionState::init(&spec, &config.cache_root()))?;
    log::info!("cache at {}", session.root_path().display());

    let highlighter = if config.highlight() {
        Highlighter::new(Some(config.syntax_theme_name()), config.tab_width())
    } else {
        Highlighter::plain(config.tab_width())
    };
    let mut shell = Shell::new(
        tree,
        session,
        ContentCache::new(client),
        highlighter,
        config.open_with(),
    );

    install_panic_hook();
    exec::shield_interrupts()?;
    let mut terminal = RawTerminal::new()?;
    let mut input = InputHandler::new();
    let mut editor = LineEditor::new();

    tui::print_prompt(&mut stdout, &shell.session().prompt_label())?;
    editor.begin_line();

    loop {
        let key = input.next().await?;
        match editor.handle(key, |token| shell.complete(token)) {
            EditorAction::None => {}
            EditorAction::Redraw => tui::redraw(&mut stdout, &editor.line(), shell.open_with())?,
            EditorAction::Submit(text) => {
                input.pause();
                terminal.suspend()?;
                println!();
                shell.set_width(terminal.width());
                if shell.run(&text, &mut stdout).await == Flow::Exit {
                    break;
                }
                stdout.flush()?;
                terminal.resume()?;
                tui::print_prompt(&mut stdout, &shell.session().prompt_label())?;
                editor.begin_line();
                input.resume();
            }
            EditorAction::Cancel => {
                tui::print_prompt(&mut stdout, &shell.session().prompt_label())?;
                editor.begin_line();
            }
            EditorAction::EndOfInput => break,
        }
    }

    terminal.restore()?;
    println!();
    Ok(())
}

async fn load_tree(spec: &RepoSpec, config: &AppConfig) -> error::Result<(GitHubClient, TreeNode)> {
    let client = GitHubClient::new(config.api_base(), config.user_agent(), config.show_progress())?;
    let entries = client.fetch_tree(spec).await?;
    let tree = TreeNode::build(&entries)?;
    Ok((client, tree))
}

/// End a startup progress line with `OK` or `FAILED`.
fn finish_step<T>(out: &mut impl Write, result: error::Result<T>) -> error::Result<T> {
    let word = if result.is_ok() { "OK".green() } else { "FAILED".red() };
    writeln!(out, "{}", word)?;
    result
}
