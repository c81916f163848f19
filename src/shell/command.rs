use std::ops::Range;

/// Built-in command keywords.
pub const KEYWORDS: &[&str] = &["cat", "ls", "cd", "exit"];

/// Listing style for `ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Plain,
    /// `-R`
    Recursive,
    /// `-T`
    Tree,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    List { mode: ListMode, path: String },
    ChangeDir(String),
    Cat(String),
    /// Fetch a file into the cache, then open it with an external program.
    Open { program: String, path: String },
    /// Anything else, run by the system shell.
    Exec(String),
}

impl Command {
    /// Parse trimmed command text.
    ///
    /// Checked in order: `exit`, `ls`, `cd`, `cat`, programs from `open_with`,
    /// then passthrough.
    pub fn parse(text: &str, open_with: &[String]) -> Command {
        let text = text.trim();
        if text.is_empty() {
            return Command::Empty;
        }
        if text == "exit" {
            return Command::Exit;
        }

        let (head, rest) = split_head(text);
        match head {
            "ls" => parse_ls(rest),
            "cd" => Command::ChangeDir(rest.to_string()),
            "cat" => Command::Cat(rest.to_string()),
            program if !rest.is_empty() && open_with.iter().any(|p| p == program) => {
                Command::Open {
                    program: program.to_string(),
                    path: rest.to_string(),
                }
            }
            _ => Command::Exec(text.to_string()),
        }
    }
}

/// Split off the first whitespace-delimited word.
fn split_head(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim()),
        None => (text, ""),
    }
}

fn parse_ls(rest: &str) -> Command {
    let mut mode = ListMode::Plain;
    let mut path = rest;
    if let Some(flags) = rest.strip_prefix('-') {
        let (options, remainder) = split_head(flags);
        if options.contains('T') {
            mode = ListMode::Tree;
        } else if options.contains('R') {
            mode = ListMode::Recursive;
        }
        path = remainder;
    }
    Command::List {
        mode,
        path: path.to_string(),
    }
}

/// Byte range of the command keyword the line starts with, if any.
/// Leading whitespace is skipped.
pub fn keyword_span(line: &str, open_with: &[String]) -> Option<Range<usize>> {
    let start = line.len() - line.trim_start().len();
    let rest = &line[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let head = &rest[..end];
    let known = KEYWORDS.contains(&head) || open_with.iter().any(|p| p == head);
    (known && !head.is_empty()).then_some(start..start + end)
}
