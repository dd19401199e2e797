use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use crossterm::tty::IsTty;
use tracing::{info, warn};

use ralphdock::docker::ContainerState;
use ralphdock::provision::ExistingAction;

/// Ask whether to recreate an existing container. Anything but `y` reuses it.
///
/// Without a terminal on stdin there is nobody to ask, so the container is
/// reused. Ctrl-C aborts the process; nothing has been changed at this point.
pub fn ask_existing(state: &ContainerState) -> ExistingAction {
    if !io::stdin().is_tty() {
        info!(container = %state.name, "stdin is not a terminal, reusing existing container");
        return ExistingAction::Reuse;
    }

    let mut stderr = io::stderr();
    let _ = write!(
        stderr,
        "Container {} already exists ({}). Recreate it? [y/N] ",
        state.name, state.status
    );
    let _ = stderr.flush();

    let answer = match read_answer() {
        Ok(answer) => answer,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => {
            let _ = writeln!(stderr);
            eprintln!("aborted");
            std::process::exit(130);
        }
        Err(e) => {
            warn!("could not read answer ({e}), reusing existing container");
            false
        }
    };
    let _ = writeln!(stderr, "{}", if answer { "y" } else { "n" });

    if answer {
        ExistingAction::Recreate
    } else {
        ExistingAction::Reuse
    }
}

fn read_answer() -> io::Result<bool> {
    terminal::enable_raw_mode()?;
    let result = wait_for_key();
    terminal::disable_raw_mode()?;
    result
}

fn wait_for_key() -> io::Result<bool> {
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        return match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"))
            }
            (KeyCode::Char('y' | 'Y'), _) => Ok(true),
            _ => Ok(false),
        };
    }
}
