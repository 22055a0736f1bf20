use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::state::SchedulerState;
use crate::types::{Command, Transition};

/// Why the listener returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// `quit` / `q` was read.
    Quit,
    /// The control channel reached end of input or failed.
    Closed,
}

/// Read commands line by line and apply them to `state` until `quit` or
/// end of input. Replies go to `out`.
///
/// Only the shared state is touched; the cycle driver picks up phase
/// changes at its next tick.
pub fn listen<R: BufRead, W: Write>(input: R, mut out: W, state: &SchedulerState) -> ListenerExit {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("control channel read failed: {e}");
                return ListenerExit::Closed;
            }
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        let reply = match (&command, state.apply(&command)) {
            (_, Transition::Started) => "started".to_string(),
            (_, Transition::AlreadyRunning) => "already running".to_string(),
            (_, Transition::Stopped) => "stopped".to_string(),
            (_, Transition::AlreadyPaused) => "already paused".to_string(),
            (_, Transition::ShutdownRequested) => "shutting down".to_string(),
            (Command::Unknown(word), _) => {
                warn!(command = %word, "unknown console command");
                format!("unknown command: {word} (use start, stop, quit)")
            }
            (_, Transition::Ignored) => "shutting down".to_string(),
        };
        if let Err(e) = writeln!(out, "{reply}").and_then(|()| out.flush()) {
            warn!("console reply write failed: {e}");
        }

        if command == Command::Quit {
            return ListenerExit::Quit;
        }
    }

    ListenerExit::Closed
}

/// Run [`listen`] over stdin/stdout on a dedicated thread.
///
/// A plain OS thread is used so that a pending stdin read never delays
/// process exit after the loop has stopped.
pub fn spawn_console_listener(state: Arc<SchedulerState>) -> std::io::Result<JoinHandle<ListenerExit>> {
    std::thread::Builder::new()
        .name("console-listener".to_string())
        .spawn(move || {
            let exit = listen(std::io::stdin().lock(), std::io::stdout(), &state);
            match exit {
                ListenerExit::Quit => info!("console listener finished"),
                ListenerExit::Closed => {
                    warn!(phase = %state.phase(), "console input closed; loop keeps its current phase")
                }
            }
            exit
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;
    use std::io::Cursor;

    fn run(script: &str, initial: Phase) -> (ListenerExit, SchedulerState, String) {
        let state = SchedulerState::new(initial);
        let mut out = Vec::new();
        let exit = listen(Cursor::new(script.to_string()), &mut out, &state);
        (exit, state, String::from_utf8(out).unwrap())
    }

    #[test]
    fn start_then_end_of_input() {
        let (exit, state, out) = run("start\n", Phase::Paused);
        assert_eq!(exit, ListenerExit::Closed);
        assert_eq!(state.phase(), Phase::Running);
        assert_eq!(out, "started\n");
        assert!(!state.is_shutting_down());
    }

    #[test]
    fn quit_stops_reading() {
        let (exit, state, out) = run("START\nq\nstart\n", Phase::Paused);
        assert_eq!(exit, ListenerExit::Quit);
        assert!(state.is_shutting_down());
        assert_eq!(out, "started\nshutting down\n");
    }

    #[test]
    fn unknown_commands_are_echoed() {
        let (_, state, out) = run("status\n\nstop\n", Phase::Running);
        assert!(out.starts_with("unknown command: status"));
        assert!(out.ends_with("stopped\n"));
        assert_eq!(state.phase(), Phase::Paused);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn reply_failures_do_not_stop_commands() {
        let state = SchedulerState::new(Phase::Paused);
        let exit = listen(Cursor::new("start
quit
".to_string()), BrokenPipe, &state);
        assert_eq!(exit, ListenerExit::Quit);
        assert!(state.is_shutting_down());
    }

    #[test]
    fn redundant_commands_are_acknowledged() {
        let (_, _, out) = run("stop\nstart\nstart\n", Phase::Paused);
        assert_eq!(out, "already paused\nstarted\nalready running\n");
    }
}
