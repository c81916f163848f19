use std::io::{self, Write};

use crossterm::{
    cursor::MoveToColumn,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute, queue,
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};

use crate::error::Result;
use crate::shell::command::keyword_span;

/// Raw-mode guard for the prompt.
///
/// Raw mode is only held while a line is being edited; commands run with
/// the terminal in its normal mode. Dropping the guard restores the terminal.
pub struct RawTerminal {
    raw: bool,
}

impl RawTerminal {
    pub fn new() -> Result<Self> {
        let mut term = Self { raw: false };
        term.resume()?;
        execute!(io::stdout(), EnableBracketedPaste)?;
        Ok(term)
    }

    /// Give the terminal back for a command.
    pub fn suspend(&mut self) -> Result<()> {
        if self.raw {
            terminal::disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    /// Take the terminal back for editing.
    pub fn resume(&mut self) -> Result<()> {
        if !self.raw {
            terminal::enable_raw_mode()?;
            self.raw = true;
        }
        Ok(())
    }

    /// Current width in columns, 80 if unknown.
    pub fn width(&self) -> usize {
        terminal::size().map(|(w, _)| w as usize).unwrap_or(80)
    }

    /// Restore the terminal to its original state.
    pub fn restore(&mut self) -> Result<()> {
        execute!(io::stdout(), DisableBracketedPaste)?;
        self.suspend()
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Install a panic hook that restores the terminal before printing panic info.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste);
        original_hook(panic_info);
    }));
}

/// Print the information line and a fresh prompt.
pub fn print_prompt(out: &mut impl Write, label: &str) -> Result<()> {
    queue!(
        out,
        Print("\r\n"),
        Print(label.magenta()),
        Print("\r\n"),
        Print(prompt())
    )?;
    out.flush()?;
    Ok(())
}

/// Redraw the prompt line after the buffer changed.
pub fn redraw(out: &mut impl Write, line: &str, open_with: &[String]) -> Result<()> {
    queue!(
        out,
        Clear(ClearType::CurrentLine),
        MoveToColumn(0),
        Print(prompt()),
        Print(render_line(line, open_with))
    )?;
    out.flush()?;
    Ok(())
}

fn prompt() -> String {
    "> ".red().bold().to_string()
}

/// The edited line with a leading command keyword in green.
pub fn render_line(line: &str, open_with: &[String]) -> String {
    match keyword_span(line, open_with) {
        Some(span) => format!(
            "{}{}{}",
            &line[..span.start],
            (&line[span.clone()]).green(),
            &line[span.end..]
        ),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: &str = "\x1b[38;5;10m";

    #[test]
    fn keyword_is_coloured() {
        let open = vec!["subl".to_string()];
        let out = render_line("ls -R", &open);
        assert!(out.starts_with(GREEN));
        assert!(out.contains(&format!("{}ls", GREEN)));
        assert!(out.ends_with(" -R"));
        let out = render_line("subl x", &open);
        assert!(out.starts_with(&format!("{}subl", GREEN)));
    }

    #[test]
    fn keyword_after_leading_spaces_is_coloured() {
        let out = render_line("  ls", &[]);
        assert!(out.starts_with(&format!("  {}ls", GREEN)));
    }

    #[test]
    fn other_commands_are_left_alone() {
        assert_eq!(render_line("lsof -i", &[]), "lsof -i");
        assert_eq!(render_line("", &[]), "");
    }

    #[test]
    fn prompt_line_is_written() {
        let mut out = Vec::new();
        redraw(&mut out, "cat x", &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("> "));
        assert!(text.ends_with(" x"));
    }
}
