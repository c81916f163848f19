//! Line editor: turns raw key input into submitted command lines.
//!
//! The editor is a small state machine. It only accepts input while
//! `Editing`; submitting a line moves it back to `Idle` until the caller has
//! finished the command and printed the next prompt (`begin_line`). This keeps
//! at most one command in flight and stops keys typed during a slow fetch from
//! corrupting the buffer.

/// Maximum number of submitted lines kept in history.
pub const HISTORY_LIMIT: usize = 50;

/// One unit of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    /// Printable text: a single keystroke or a pasted chunk.
    Text(String),
    Backspace,
    Tab,
    Up,
    Down,
    /// Enter or carriage return.
    Enter,
    /// Ctrl-D.
    EndOfTransmission,
    /// Ctrl-C.
    Interrupt,
    /// A control key with no binding of its own. Ends the line like Enter.
    Control,
}

/// Editor state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Between prompts; input is ignored.
    #[default]
    Idle,
    /// Accumulating a command line.
    Editing,
}

/// What the caller should do after feeding one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Nothing visible changed.
    None,
    /// The buffer changed; redraw the prompt line.
    Redraw,
    /// A line was completed. Contains the trimmed text.
    Submit(String),
    /// The line was abandoned.
    Cancel,
    /// End of input on an empty line.
    EndOfInput,
}

/// Bounded history of submitted buffers with a navigation cursor.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Vec<String>>,
    /// `None` while editing a fresh line.
    cursor: Option<usize>,
    /// The fresh line that was being edited before navigating away from it.
    draft: Vec<String>,
}

impl History {
    /// Append a submitted buffer, evicting the oldest beyond the limit.
    pub fn push(&mut self, entry: Vec<String>) {
        self.entries.push(entry);
        if self.entries.len() > HISTORY_LIMIT {
            let excess = self.entries.len() - HISTORY_LIMIT;
            self.entries.drain(..excess);
        }
        self.reset_cursor();
    }

    /// Return to the fresh line.
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
        self.draft.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// History lines, oldest first.
    #[allow(dead_code)]
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|e| e.concat())
    }

    /// Step to the next older entry. `current` is saved as the draft when
    /// leaving the fresh line. Returns `None` when already at the oldest.
    fn older(&mut self, current: &[String]) -> Option<Vec<String>> {
        let next = match self.cursor {
            None if !self.entries.is_empty() => {
                self.draft = current.to_vec();
                self.entries.len() - 1
            }
            Some(i) if i > 0 => i - 1,
            _ => return None,
        };
        self.cursor = Some(next);
        Some(self.entries[next].clone())
    }

    /// Step to the next newer entry, or back to the draft past the newest.
    fn newer(&mut self) -> Option<Vec<String>> {
        match self.cursor {
            Some(i) if i + 1 < self.entries.len() => {
                self.cursor = Some(i + 1);
                Some(self.entries[i + 1].clone())
            }
            Some(_) => {
                self.cursor = None;
                Some(std::mem::take(&mut self.draft))
            }
            None => None,
        }
    }
}

/// The line editing state machine.
#[derive(Debug, Default)]
pub struct LineEditor {
    state: EditorState,
    /// Input chunks of the line being edited.
    buffer: Vec<String>,
    history: History,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn state(&self) -> EditorState {
        self.state
    }

    #[allow(dead_code)]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Start editing a fresh line. Called once the prompt has been printed.
    pub fn begin_line(&mut self) {
        self.buffer.clear();
        self.history.reset_cursor();
        self.state = EditorState::Editing;
    }

    /// The in-progress line as text.
    pub fn line(&self) -> String {
        self.buffer.concat()
    }

    /// Feed one input event.
    ///
    /// `complete` maps the final whitespace-delimited token of the line to
    /// the text that completes it, or an empty string for no completion.
    pub fn handle(
        &mut self,
        input: EditorInput,
        complete: impl FnOnce(&str) -> String,
    ) -> EditorAction {
        if self.state == EditorState::Idle {
            return EditorAction::None;
        }

        match input {
            EditorInput::Text(text) => {
                self.buffer.push(text);
                EditorAction::Redraw
            }
            EditorInput::Backspace => {
                self.buffer.pop();
                EditorAction::Redraw
            }
            EditorInput::Tab => {
                let line = self.line();
                let token = line.rsplit(char::is_whitespace).next().unwrap_or("");
                let completion = complete(token);
                if completion.is_empty() {
                    return EditorAction::None;
                }
                self.buffer.push(completion);
                EditorAction::Redraw
            }
            EditorInput::Up => match self.history.older(&self.buffer) {
                Some(entry) => {
                    self.buffer = entry;
                    EditorAction::Redraw
                }
                None => EditorAction::None,
            },
            EditorInput::Down => match self.history.newer() {
                Some(entry) => {
                    self.buffer = entry;
                    EditorAction::Redraw
                }
                None => EditorAction::None,
            },
            EditorInput::Enter | EditorInput::Control => self.submit(),
            EditorInput::EndOfTransmission if self.buffer.is_empty() => {
                self.state = EditorState::Idle;
                EditorAction::EndOfInput
            }
            EditorInput::EndOfTransmission => self.submit(),
            EditorInput::Interrupt => {
                self.buffer.clear();
                self.history.reset_cursor();
                self.state = EditorState::Idle;
                EditorAction::Cancel
            }
        }
    }

    fn submit(&mut self) -> EditorAction {
        let text = self.line().trim().to_string();
        self.history.push(std::mem::take(&mut self.buffer));
        self.state = EditorState::Idle;
        EditorAction::Submit(text)
    }
}
