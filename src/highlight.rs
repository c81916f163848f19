use std::path::Path;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Known binary file extensions.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "tar", "gz", "bz2", "xz", "so", "dylib",
    "exe", "bin", "wasm", "woff", "woff2", "ttf",
];

/// Terminal syntax highlighter for `cat` output.
pub struct Highlighter {
    /// `None` when highlighting is disabled.
    syntax: Option<(SyntaxSet, Theme)>,
    tab_width: usize,
}

impl Highlighter {
    pub fn new(theme_name: Option<&str>, tab_width: usize) -> Self {
        Self {
            syntax: Some((SyntaxSet::load_defaults_newlines(), load_theme(theme_name))),
            tab_width,
        }
    }

    /// A highlighter that only expands tabs.
    pub fn plain(tab_width: usize) -> Self {
        Self {
            syntax: None,
            tab_width,
        }
    }

    /// Render `content` of the file named `file_name` for the terminal.
    ///
    /// Falls back to plain text if the highlighter fails on any line.
    pub fn render(&self, file_name: &str, content: &str) -> String {
        let rendered = match &self.syntax {
            Some((ss, theme)) => highlight(ss, theme, file_name, content)
                .unwrap_or_else(|| content.to_string()),
            None => content.to_string(),
        };
        let mut out = rendered.replace('\t', &" ".repeat(self.tab_width));
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Load a theme from the built-in theme set by name, with fallback.
pub fn load_theme(theme_name: Option<&str>) -> Theme {
    let ts = ThemeSet::load_defaults();
    let name = theme_name.unwrap_or("base16-ocean.dark");
    ts.themes
        .get(name)
        .cloned()
        .unwrap_or_else(|| ts.themes["base16-ocean.dark"].clone())
}

fn highlight(ss: &SyntaxSet, theme: &Theme, file_name: &str, content: &str) -> Option<String> {
    let syntax = find_syntax(ss, file_name, content);
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = String::with_capacity(content.len() * 2);
    for line in LinesWithEndings::from(content) {
        let ranges = highlighter.highlight_line(line, ss).ok()?;
        out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
    }
    // Reset before the final newline so the prompt is not coloured.
    if out.ends_with('\n') {
        out.pop();
        out.push_str("\x1b[0m\n");
    } else {
        out.push_str("\x1b[0m");
    }
    Some(out)
}

/// Pick a syntax by extension, then full file name (`Makefile`), then the
/// first line (shebangs, modelines).
fn find_syntax<'a>(ss: &'a SyntaxSet, file_name: &str, content: &str) -> &'a SyntaxReference {
    let path = Path::new(file_name);
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| ss.find_syntax_by_extension(ext))
        .or_else(|| ss.find_syntax_by_extension(file_name))
        .or_else(|| {
            content
                .lines()
                .next()
                .and_then(|first| ss.find_syntax_by_first_line(first))
        })
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

/// Check if content is binary by extension or null-byte scan of the first 8KB.
pub fn is_binary(file_name: &str, content: &[u8]) -> bool {
    if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        if BINARY_EXTENSIONS.iter().any(|&b| b.eq_ignore_ascii_case(ext)) {
            return true;
        }
    }
    content[..content.len().min(8192)].contains(&0)
}
