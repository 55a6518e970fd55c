use cmdflow_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using CmdFlowError
pub type Result<T> = std::result::Result<T, CmdFlowError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code usable by hosts for programmatic handling
/// and by tests for assertions that do not depend on message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    CommandNotFound,
    AutomationNotFound,

    // Argument validation (raised before a command body runs)
    MissingArgument,
    TypeMismatch,
    ValidationFailed,

    // Execution
    CommandExecution,

    // Condition language
    ConditionParse,
    ConditionEvaluation,

    // Host layer
    Forbidden,
    Host,
    Config,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::CommandNotFound => "ERR_COMMAND_NOT_FOUND",
            ExErrorKind::AutomationNotFound => "ERR_AUTOMATION_NOT_FOUND",
            ExErrorKind::MissingArgument => "ERR_MISSING_ARGUMENT",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::CommandExecution => "ERR_COMMAND_EXECUTION",
            ExErrorKind::ConditionParse => "ERR_CONDITION_PARSE",
            ExErrorKind::ConditionEvaluation => "ERR_CONDITION_EVALUATION",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::Host => "ERR_HOST",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for failures raised by the registry before a command body is invoked
    pub fn is_registry_level(&self) -> bool {
        matches!(
            self,
            ExErrorKind::CommandNotFound
                | ExErrorKind::MissingArgument
                | ExErrorKind::TypeMismatch
                | ExErrorKind::ValidationFailed
        )
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus free-form context for
/// humans. Built from a `CmdFlowError` via `From`, or directly with the builder
/// methods.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    arg: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            arg: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Name of the operation that failed (e.g. `command_execute`)
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Command, automation or step id the error refers to
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(arg) = &self.arg {
            write!(f, " (arg: {})", arg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for command dispatch and automation execution
///
/// Registry-level variants (`CommandNotFound`, `MissingArgument`,
/// `TypeMismatch`, `ValidationFailed`) are raised before a command body runs.
/// `CommandExecution` is the opaque failure a command body reports; the
/// registry propagates it unchanged. `ConditionParse`/`ConditionEvaluation`
/// never escape the automation runner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmdFlowError {
    /// No command registered under this id
    #[error("Command not found: {command_id}")]
    CommandNotFound { command_id: String },

    /// No automation registered under this id
    #[error("Automation not found: {automation_id}")]
    AutomationNotFound { automation_id: String },

    /// Required argument absent and no default declared
    #[error("Missing required argument '{arg}' for command {command_id}")]
    MissingArgument { command_id: String, arg: String },

    /// Primitive type check failed
    #[error("Argument '{arg}' of command {command_id} must be of type {expected}, got {actual}")]
    TypeMismatch {
        command_id: String,
        arg: String,
        expected: String,
        actual: String,
    },

    /// Custom validation hook rejected the value
    #[error("Validation failed for argument '{arg}' of command {command_id}: {message}")]
    ValidationFailed {
        command_id: String,
        arg: String,
        message: String,
    },

    /// Failure reported by a command body
    #[error("{message}")]
    CommandExecution { command_id: String, message: String },

    /// Condition expression could not be parsed
    #[error("Failed to parse condition '{expression}' at {position}: {message}")]
    ConditionParse {
        expression: String,
        position: usize,
        message: String,
    },

    /// Condition expression failed while being evaluated
    #[error("Failed to evaluate condition '{expression}': {message}")]
    ConditionEvaluation { expression: String, message: String },

    /// Caller lacks every role the command allows (host dispatch layer only)
    #[error("User {user} is not allowed to execute command {command_id}")]
    Forbidden { command_id: String, user: String },

    /// A host capability (workspace, jobs, ...) refused or failed an operation
    #[error("{capability}: {message}")]
    Host { capability: String, message: String },

    /// Invalid engine configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CmdFlowError {
    /// Build a body-level failure for `command_id`
    pub fn execution(command_id: impl Into<String>, message: impl Into<String>) -> Self {
        CmdFlowError::CommandExecution {
            command_id: command_id.into(),
            message: message.into(),
        }
    }

    /// Build a failure reported by a host capability
    pub fn host(capability: impl Into<String>, message: impl Into<String>) -> Self {
        CmdFlowError::Host {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Message suitable for a run log line
    ///
    /// For body-level failures this is the body's own message, verbatim.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Conversion from CmdFlowError to ExError
impl From<CmdFlowError> for ExError {
    fn from(err: CmdFlowError) -> Self {
        let message = err.to_string();
        match err {
            CmdFlowError::CommandNotFound { command_id } => {
                ExError::new(ExErrorKind::CommandNotFound)
                    .with_entity_id(command_id)
                    .with_message(message)
            }
            CmdFlowError::AutomationNotFound { automation_id } => {
                ExError::new(ExErrorKind::AutomationNotFound)
                    .with_entity_id(automation_id)
                    .with_message(message)
            }
            CmdFlowError::MissingArgument { command_id, arg } => {
                ExError::new(ExErrorKind::MissingArgument)
                    .with_entity_id(command_id)
                    .with_arg(arg)
                    .with_message(message)
            }
            CmdFlowError::TypeMismatch {
                command_id, arg, ..
            } => ExError::new(ExErrorKind::TypeMismatch)
                .with_entity_id(command_id)
                .with_arg(arg)
                .with_message(message),
            CmdFlowError::ValidationFailed {
                command_id, arg, ..
            } => ExError::new(ExErrorKind::ValidationFailed)
                .with_entity_id(command_id)
                .with_arg(arg)
                .with_message(message),
            CmdFlowError::CommandExecution { command_id, .. } => {
                ExError::new(ExErrorKind::CommandExecution)
                    .with_entity_id(command_id)
                    .with_message(message)
            }
            CmdFlowError::ConditionParse { .. } => {
                ExError::new(ExErrorKind::ConditionParse).with_message(message)
            }
            CmdFlowError::ConditionEvaluation { .. } => {
                ExError::new(ExErrorKind::ConditionEvaluation).with_message(message)
            }
            CmdFlowError::Forbidden { command_id, .. } => ExError::new(ExErrorKind::Forbidden)
                .with_entity_id(command_id)
                .with_message(message),
            CmdFlowError::Host { capability, .. } => ExError::new(ExErrorKind::Host)
                .with_op(capability)
                .with_message(message),
            CmdFlowError::Config { .. } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }
            CmdFlowError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to CmdFlowError
impl From<serde_json::Error> for CmdFlowError {
    fn from(err: serde_json::Error) -> Self {
        CmdFlowError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CmdFlowError {
    fn from(err: toml::de::Error) -> Self {
        CmdFlowError::Config {
            message: err.to_string(),
        }
    }
}
