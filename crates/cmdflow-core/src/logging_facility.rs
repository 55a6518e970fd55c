//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use cmdflow_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! ## Boundary ownership
//!
//! `CommandRegistry::execute` owns the `command_execute` boundary. The engine
//! owns `automation_run` and `command_dispatch`. Everything below those
//! boundaries logs with plain `tracing::debug!`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
