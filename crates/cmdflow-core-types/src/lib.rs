//! Leaf types shared by the cmdflow crates
//!
//! - **Correlation ids**: `RunId`, `RequestId`, `TraceId`
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction
//! - **Schema constants**: canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestId, RunId, TraceId};
pub use sensitive::Sensitive;
