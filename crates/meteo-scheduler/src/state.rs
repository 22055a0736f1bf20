use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::types::{Command, Phase, Transition};

/// Scheduler state shared by the console listener (writer) and the cycle
/// driver (reader).
///
/// The phase is a single atomic and shutdown is a cancellation token, so
/// neither side ever takes a lock.
#[derive(Debug)]
pub struct SchedulerState {
    phase: AtomicU8,
    shutdown: CancellationToken,
}

impl SchedulerState {
    pub fn new(initial: Phase) -> Self {
        Self {
            phase: AtomicU8::new(initial as u8),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Token cancelled when shutdown is requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Apply an operator command.
    pub fn apply(&self, command: &Command) -> Transition {
        match command {
            Command::Start => self.swap(Phase::Paused, Phase::Running, Transition::Started),
            Command::Stop => self.swap(Phase::Running, Phase::Paused, Transition::Stopped),
            Command::Quit => self.request_shutdown(),
            Command::Unknown(_) => Transition::Ignored,
        }
    }

    /// Enter the terminal phase and cancel any pending interval wait.
    pub fn request_shutdown(&self) -> Transition {
        let previous = self.phase.swap(Phase::ShuttingDown as u8, Ordering::AcqRel);
        self.shutdown.cancel();
        if Phase::from_u8(previous) == Phase::ShuttingDown {
            Transition::Ignored
        } else {
            info!("shutdown requested");
            Transition::ShutdownRequested
        }
    }

    fn swap(&self, from: Phase, to: Phase, done: Transition) -> Transition {
        match self
            .phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                info!(phase = %to, "scheduler phase changed");
                done
            }
            Err(current) => match Phase::from_u8(current) {
                Phase::Running => Transition::AlreadyRunning,
                Phase::Paused => Transition::AlreadyPaused,
                Phase::ShuttingDown => Transition::Ignored,
            },
        }
    }
}
