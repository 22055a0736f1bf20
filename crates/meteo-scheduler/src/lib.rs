//! `meteo-scheduler` — the run loop and its operator console.
//!
//! # Overview
//!
//! Two units of execution share one [`SchedulerState`]:
//!
//! | unit | role |
//! |------|------|
//! | console listener (OS thread) | reads `start` / `stop` / `quit` and mutates the state |
//! | [`IngestEngine::run`] (Tokio task) | reads the phase each tick and runs or skips a cycle |
//!
//! The listener never calls into the fetcher, converter or stores; the
//! engine never reads the console.

pub mod console;
pub mod engine;
pub mod state;
pub mod types;

pub use console::{listen, spawn_console_listener, ListenerExit};
pub use engine::IngestEngine;
pub use state::SchedulerState;
pub use types::{Command, CycleReport, Phase, RunSummary, TickReport, Transition};
