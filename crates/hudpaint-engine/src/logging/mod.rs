//! Logger initialization.
//!
//! The engine logs through the `log` facade only; hosts may install any
//! backend. [`init_logging`] is a convenience that installs `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig};
