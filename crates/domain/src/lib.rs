pub mod config;
pub mod error;
pub mod trace;

pub use config::{SessionConfig, StopReporting};
pub use error::{Error, Result};
pub use trace::TraceEvent;
