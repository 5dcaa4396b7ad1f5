use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::debug;

use edgeprobe_core::scanner::StopSignal;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches the keyboard for 'q' or Ctrl-C and fires the stop signal.
///
/// Raw mode is only entered when stdin is a terminal. Dropping the handle
/// ends the watcher and restores the terminal.
pub struct InputHandle {
    done: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

pub fn is_interrupt(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    let is_q = matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'));
    let is_ctrl_c =
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
    is_q || is_ctrl_c
}

impl InputHandle {
    pub fn start(stop: StopSignal) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        if !std::io::stdin().is_terminal() {
            return Self {
                done,
                watcher: None,
            };
        }
        if let Err(e) = enable_raw_mode() {
            debug!("keyboard listener unavailable: {e}");
            return Self {
                done,
                watcher: None,
            };
        }

        let finished = Arc::clone(&done);
        let watcher = thread::spawn(move || {
            while !finished.load(Ordering::Relaxed) && !stop.is_stopped() {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {
                        if let Ok(Event::Key(key)) = event::read()
                            && is_interrupt(&key)
                        {
                            stop.stop();
                        }
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
            let _ = disable_raw_mode();
        });

        Self {
            done,
            watcher: Some(watcher),
        }
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
        let _ = disable_raw_mode();
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_and_ctrl_c_interrupt() {
        assert!(is_interrupt(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_interrupt(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_interrupt(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_interrupt(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }
}
