use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::editor::EditorInput;
use crate::error::{AppError, Result};

/// Poll interval of the input thread.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reads terminal input on a blocking thread and forwards it as
/// [`EditorInput`] through a channel.
///
/// Reading can be paused while an external command owns the terminal.
pub struct InputHandler {
    rx: mpsc::UnboundedReceiver<EditorInput>,
    active: Arc<AtomicBool>,
}

impl InputHandler {
    /// Start the input thread. It begins active.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();

        tokio::task::spawn_blocking(move || loop {
            if !active_clone.load(Ordering::Relaxed) {
                std::thread::sleep(POLL_INTERVAL);
                if tx.is_closed() {
                    break;
                }
                continue;
            }
            if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                if tx.is_closed() {
                    break;
                }
                continue;
            }
            let input = match event::read() {
                Ok(CrosstermEvent::Key(key)) => key_to_input(key),
                Ok(CrosstermEvent::Paste(text)) => Some(EditorInput::Text(text)),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("terminal read failed: {}", e);
                    break;
                }
            };
            if let Some(input) = input {
                if tx.send(input).is_err() {
                    break;
                }
            }
        });

        Self { rx, active }
    }

    /// Stop reading the terminal.
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Resume reading the terminal.
    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Receive the next input (waits until available).
    pub async fn next(&mut self) -> Result<EditorInput> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("input channel closed".into()))
    }
}

/// Map a key event to editor input. Releases and unbound navigation keys map
/// to `None`.
pub fn key_to_input(key: KeyEvent) -> Option<EditorInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(EditorInput::Interrupt),
        KeyCode::Char('d') if ctrl => Some(EditorInput::EndOfTransmission),
        KeyCode::Char(_) if ctrl => Some(EditorInput::Control),
        KeyCode::Char(c) => Some(EditorInput::Text(c.to_string())),
        KeyCode::Backspace => Some(EditorInput::Backspace),
        KeyCode::Tab => Some(EditorInput::Tab),
        KeyCode::Up => Some(EditorInput::Up),
        KeyCode::Down => Some(EditorInput::Down),
        KeyCode::Enter => Some(EditorInput::Enter),
        KeyCode::Esc => Some(EditorInput::Control),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn printable_keys_become_text() {
        assert_eq!(
            key_to_input(press(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(EditorInput::Text("x".into()))
        );
        assert_eq!(
            key_to_input(press(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some(EditorInput::Text("X".into()))
        );
    }

    #[test]
    fn control_keys() {
        assert_eq!(
            key_to_input(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(EditorInput::Interrupt)
        );
        assert_eq!(
            key_to_input(press(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(EditorInput::EndOfTransmission)
        );
        assert_eq!(
            key_to_input(press(KeyCode::Char('z'), KeyModifiers::CONTROL)),
            Some(EditorInput::Control)
        );
        assert_eq!(key_to_input(press(KeyCode::Esc, KeyModifiers::NONE)), Some(EditorInput::Control));
    }

    #[test]
    fn editing_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_input(press(KeyCode::Backspace, none)), Some(EditorInput::Backspace));
        assert_eq!(key_to_input(press(KeyCode::Tab, none)), Some(EditorInput::Tab));
        assert_eq!(key_to_input(press(KeyCode::Up, none)), Some(EditorInput::Up));
        assert_eq!(key_to_input(press(KeyCode::Down, none)), Some(EditorInput::Down));
        assert_eq!(key_to_input(press(KeyCode::Enter, none)), Some(EditorInput::Enter));
        assert_eq!(key_to_input(press(KeyCode::Left, none)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(key_to_input(release), None);
    }
}
