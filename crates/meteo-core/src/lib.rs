//! `meteo-core` — configuration, the `Reading` record and shared helpers
//! used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod stamp;
pub mod types;

pub use error::{MeteoError, Result};
pub use types::{Outcome, Reading};
