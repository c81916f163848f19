//! Command dispatch against the repository tree.

pub mod command;
pub mod listing;

use std::io::Write;
use std::path::PathBuf;

use crossterm::style::Stylize;

use crate::cache::ContentCache;
use crate::error::{AppError, Result};
use crate::exec;
use crate::highlight::{self, Highlighter};
use crate::remote::ContentSource;
use crate::repo::TreeNode;
use crate::session::SessionState;

pub use command::{Command, ListMode};

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interprets command lines for one session.
pub struct Shell<S> {
    tree: TreeNode,
    session: SessionState,
    cache: ContentCache<S>,
    highlighter: Highlighter,
    open_with: Vec<String>,
    /// Terminal width used for column layout.
    width: usize,
}

impl<S: ContentSource> Shell<S> {
    pub fn new(
        tree: TreeNode,
        session: SessionState,
        cache: ContentCache<S>,
        highlighter: Highlighter,
        open_with: Vec<String>,
    ) -> Self {
        Self {
            tree,
            session,
            cache,
            highlighter,
            open_with,
            width: 80,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn open_with(&self) -> &[String] {
        &self.open_with
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Completion for the last token of the line being edited.
    ///
    /// The directory part of the token is resolved from the current
    /// directory; the final segment is matched against its children. Any
    /// resolution failure means no completion.
    pub fn complete(&self, token: &str) -> String {
        let (dir, prefix) = match token.rfind('/') {
            Some(0) => ("/", &token[1..]),
            Some(i) => (&token[..i], &token[i + 1..]),
            None => ("", token),
        };
        self.session
            .locate(dir)
            .and_then(|(_, segments)| self.tree.resolve(&segments))
            .map(|node| node.match_prefix(prefix))
            .unwrap_or_default()
    }

    /// Run one command line. Failures are printed to `out` as a single line
    /// and never end the session.
    pub async fn run(&mut self, text: &str, out: &mut impl Write) -> Flow {
        let command = Command::parse(text, &self.open_with);
        log::debug!("dispatch {:?}", command);
        match self.dispatch(command, out).await {
            Ok(flow) => flow,
            Err(e) => {
                let _ = writeln!(out, "{}", format!("Error: {}", e).red());
                Flow::Continue
            }
        }
    }

    /// Execute a parsed command.
    pub async fn dispatch(&mut self, command: Command, out: &mut impl Write) -> Result<Flow> {
        match command {
            Command::Empty => {}
            Command::Exit => return Ok(Flow::Exit),
            Command::List { mode, path } => self.list(mode, &path, out)?,
            Command::ChangeDir(path) => self.session.change_dir(&self.tree, &path)?,
            Command::Cat(path) => self.cat(&path, out).await?,
            Command::Open { program, path } => {
                let (local, _) = self.fetch(&path).await?;
                let line = format!("{} {}", program, exec::quote(&local));
                self.passthrough(&line, out).await?;
            }
            Command::Exec(line) => self.passthrough(&line, out).await?,
        }
        Ok(Flow::Continue)
    }

    fn list(&self, mode: ListMode, path: &str, out: &mut impl Write) -> Result<()> {
        let (_, segments) = self.session.locate(path)?;
        let node = self.tree.resolve(&segments)?;
        let label = path.trim();
        let text = match mode {
            ListMode::Plain => listing::columns(&node.list_children()?, self.width),
            ListMode::Recursive => {
                node.list_children()?;
                listing::recursive(node, label, self.width)
            }
            ListMode::Tree => {
                node.list_children()?;
                listing::tree(node, label)
            }
        };
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    async fn cat(&self, path: &str, out: &mut impl Write) -> Result<()> {
        let (local, content) = self.fetch(path).await?;
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if highlight::is_binary(&name, &content) {
            writeln!(out, "binary file ({} bytes)", content.len())?;
            return Ok(());
        }
        let text = String::from_utf8_lossy(&content);
        out.write_all(self.highlighter.render(&name, &text).as_bytes())?;
        Ok(())
    }

    /// Resolve `path` to a file of the tree and return its local cache path
    /// and content, downloading it on first access.
    async fn fetch(&self, path: &str) -> Result<(PathBuf, Vec<u8>)> {
        if path.trim().is_empty() {
            return Err(AppError::Usage("no file specified".into()));
        }
        let (local, segments) = self.session.locate(path)?;
        let node = self.tree.resolve(&segments)?;
        let locator = node
            .locator()
            .ok_or_else(|| AppError::NotAFile(path.trim().to_string()))?;
        let content = self.cache.get(&local, locator).await?;
        Ok((local, content))
    }

    async fn passthrough(&self, line: &str, out: &mut impl Write) -> Result<()> {
        out.flush()?;
        let status = exec::run(line, self.session.current_path()).await?;
        if !status.success() {
            writeln!(out, "{}", format!("[{}]", status).dark_grey())?;
        }
        Ok(())
    }
}
