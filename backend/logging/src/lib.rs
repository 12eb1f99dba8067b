//! Structured logging for the capture bridge.
//!
//! Console and rolling NDJSON output, plus a listener that journals every
//! bridge event crossing the document event target.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{BridgeEventLogger, EventLogEntry};
pub use logger::{LoggerOptions, init_logger};
pub use redact::redact_data_urls;
