use meteo_core::Reading;

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Ticks are skipped.
    Paused = 0,
    /// Each tick runs one cycle.
    Running = 1,
    /// Terminal: the loop exits at the next check.
    ShuttingDown = 2,
}

impl Phase {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Paused,
            1 => Phase::Running,
            _ => Phase::ShuttingDown,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Paused => "paused",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting down",
        };
        write!(f, "{s}")
    }
}

/// An operator command read from the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one console line. Case-insensitive, surrounding whitespace
    /// ignored. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim();
        if word.is_empty() {
            return None;
        }
        let cmd = match word.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "quit" | "q" => Command::Quit,
            _ => Command::Unknown(word.to_string()),
        };
        Some(cmd)
    }
}

/// Effect of applying a [`Command`] to the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyPaused,
    ShutdownRequested,
    /// Unknown command, or any command after shutdown began.
    Ignored,
}

/// Outcome of one cycle as seen by the coordinator.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub reading: Reading,
    pub snapshot_written: bool,
    /// Row id in the history store, `None` if the append failed.
    pub row_id: Option<i64>,
}

/// Published once per tick when a report channel is attached.
#[derive(Debug, Clone)]
pub enum TickReport {
    Cycle(CycleReport),
    Paused,
}

/// Totals returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub skipped: u64,
}
