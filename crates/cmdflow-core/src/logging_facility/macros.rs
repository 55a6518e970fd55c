//! Boundary logging macros

/// Log the start of an operation
///
/// ```
/// # use cmdflow_core::log_op_start;
/// log_op_start!("automation_run");
/// log_op_start!("automation_run", automation_id = "nightly");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use cmdflow_core::log_op_end;
/// log_op_end!("automation_run", duration_ms = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error with its canonical kind and code
///
/// `$err` is anything convertible into `ExError`. Pass an `ExError` built
/// with `with_request_id`/`with_trace_id` to carry correlation ids.
///
/// ```
/// # use cmdflow_core::{log_op_error, errors::CmdFlowError};
/// let err = CmdFlowError::CommandNotFound { command_id: "nope".to_string() };
/// log_op_error!("command_execute", err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__private::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            message = ex_err.message(),
            request_id = ex_err.request_id().map($crate::types::RequestId::as_str),
            trace_id = ex_err.trace_id().map($crate::types::TraceId::as_str),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__private::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            message = ex_err.message(),
            request_id = ex_err.request_id().map($crate::types::RequestId::as_str),
            trace_id = ex_err.trace_id().map($crate::types::TraceId::as_str),
            $($field)*
        );
    }};
}
