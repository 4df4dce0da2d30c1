//! Logging setup.
//!
//! The library only talks to the `log` facade; binaries and tests call
//! [`init_logging`] to install the `env_logger` backend.

mod init;

pub use init::{LoggingConfig, init_logging};
