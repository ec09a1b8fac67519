use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Input events consumed by the round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// An alphanumeric key, stamped when it was read
    Key { ch: char, at: Instant },
    PauseToggle,
    Quit,
}

/// Poll interval of the reader thread
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Reads the terminal on its own thread and forwards key presses
pub struct KeyReader {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyReader {
    /// Spawn the reader. It stops when `stop` is called or the receiver is dropped.
    pub fn spawn(event_tx: Sender<InputEvent>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            while !shutdown_clone.load(Ordering::Relaxed) {
                let key = match read_key() {
                    Ok(Some(key)) => key,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::error!(target: "input", "terminal read failed: {}", e);
                        let _ = event_tx.send(InputEvent::Quit);
                        break;
                    }
                };

                if let Some(event) = translate(&key, Instant::now()) {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!(target: "input", "key reader stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Enable raw mode for terminal input
pub fn enable_raw_mode() -> std::io::Result<()> {
    crossterm::terminal::enable_raw_mode()
}

/// Disable raw mode and restore terminal
pub fn disable_raw_mode() -> std::io::Result<()> {
    crossterm::terminal::disable_raw_mode()
}

/// Poll for a key press with timeout; None on timeout or non-key events
fn read_key() -> std::io::Result<Option<KeyEvent>> {
    if !event::poll(POLL_TIMEOUT)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// Map a key press to a trainer event
fn translate(key: &KeyEvent, at: Instant) -> Option<InputEvent> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Esc => Some(InputEvent::PauseToggle),
        KeyCode::Char(ch)
            if ch.is_ascii_alphanumeric()
                && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(InputEvent::Key { ch, at })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_translate_keys() {
        let at = Instant::now();

        assert_eq!(
            translate(&press(KeyCode::Char('a'), KeyModifiers::NONE), at),
            Some(InputEvent::Key { ch: 'a', at })
        );
        assert_eq!(
            translate(&press(KeyCode::Char('7'), KeyModifiers::SHIFT), at),
            Some(InputEvent::Key { ch: '7', at })
        );
        assert_eq!(
            translate(&press(KeyCode::Esc, KeyModifiers::NONE), at),
            Some(InputEvent::PauseToggle)
        );
        assert_eq!(
            translate(&press(KeyCode::Char('c'), KeyModifiers::CONTROL), at),
            Some(InputEvent::Quit)
        );
    }

    #[test]
    fn test_translate_ignores_other_keys() {
        let at = Instant::now();
        assert_eq!(translate(&press(KeyCode::Char('?'), KeyModifiers::NONE), at), None);
        assert_eq!(translate(&press(KeyCode::Char(' '), KeyModifiers::NONE), at), None);
        assert_eq!(translate(&press(KeyCode::Enter, KeyModifiers::NONE), at), None);
        assert_eq!(translate(&press(KeyCode::Char('x'), KeyModifiers::ALT), at), None);
    }
}
