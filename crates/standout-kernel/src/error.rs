//! Error types.
//!
//! [`KernelError`] covers everything that can go wrong while handling argv:
//! parse failures, missing arguments, unknown commands, failing hooks and
//! failing command bodies. Each variant carries structured fields so it can be
//! rendered for humans ([`KernelError::render`]) or inspected by exit handlers.
//!
//! [`ValidationError`] is registration-time only: it reports a malformed
//! command descriptor and never surfaces while dispatching.

use thiserror::Error;

use crate::flags::FlagType;
use crate::hooks::{HookAction, HookError, HookPhase};

/// Runtime error raised while resolving, binding or running a command.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A required positional argument was not supplied.
    #[error("E_MISSING_ARGUMENT: Missing required argument \"{argument}\"")]
    MissingArgument { argument: String, command: String },

    /// A flag value could not be cast to its declared type.
    #[error("E_INVALID_FLAG: \"{flag}\" flag expects a \"{expected}\" value")]
    InvalidFlag {
        flag: String,
        expected: FlagType,
        command: Option<String>,
    },

    /// No command matches the given name or alias.
    #[error("E_INVALID_COMMAND: \"{name}\" is not a registered command")]
    InvalidCommand {
        name: String,
        suggestions: Vec<String>,
    },

    /// A flag is neither global nor owned by the resolved command.
    #[error("E_UNKNOWN_FLAG: Unknown flag \"{flag}\"")]
    UnknownFlag { flag: String },

    /// Argv could not be split into flags and positionals.
    #[error("E_INVALID_ARGV: {message}")]
    InvalidArgv { message: String },

    /// A lifecycle hook failed.
    #[error("hook error ({phase}:{action}): {source}")]
    Hook {
        phase: HookPhase,
        action: HookAction,
        #[source]
        source: HookError,
    },

    /// A global flag handler failed.
    #[error("global flag \"{flag}\" failed: {source}")]
    GlobalFlag {
        flag: String,
        #[source]
        source: anyhow::Error,
    },

    /// The command body (or its prepare/completed steps) failed.
    #[error(transparent)]
    Command(anyhow::Error),
}

impl KernelError {
    pub(crate) fn hook(phase: HookPhase, action: HookAction, source: HookError) -> Self {
        KernelError::Hook {
            phase,
            action,
            source,
        }
    }

    /// Wraps an error returned by user code.
    ///
    /// A `KernelError` that travelled through a command body (typically from a
    /// nested [`CommandContext::exec`](crate::CommandContext::exec)) is unwrapped
    /// so callers still see the original variant.
    pub fn from_command(error: anyhow::Error) -> Self {
        match error.downcast::<KernelError>() {
            Ok(kernel_error) => kernel_error,
            Err(other) => KernelError::Command(other),
        }
    }

    /// Short machine readable code for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            KernelError::MissingArgument { .. } => "E_MISSING_ARGUMENT",
            KernelError::InvalidFlag { .. } => "E_INVALID_FLAG",
            KernelError::InvalidCommand { .. } => "E_INVALID_COMMAND",
            KernelError::UnknownFlag { .. } => "E_UNKNOWN_FLAG",
            KernelError::InvalidArgv { .. } => "E_INVALID_ARGV",
            KernelError::Hook { .. } => "E_HOOK",
            KernelError::GlobalFlag { .. } => "E_GLOBAL_FLAG",
            KernelError::Command(_) => "E_COMMAND",
        }
    }

    /// Renders the error for display on a terminal.
    ///
    /// Unlike `Display`, this adds context that does not belong in a one-line
    /// message: suggestions for unknown commands and the owning command for
    /// argument and flag errors.
    pub fn render(&self) -> String {
        match self {
            KernelError::InvalidCommand { suggestions, .. } if !suggestions.is_empty() => {
                let mut out = format!("{self}\n\nDid you mean one of these?");
                for suggestion in suggestions {
                    out.push_str("\n  ");
                    out.push_str(suggestion);
                }
                out
            }
            KernelError::MissingArgument { command, .. } => {
                format!("{self}\n\nRun \"{command} --help\" for usage")
            }
            KernelError::InvalidFlag {
                command: Some(command),
                ..
            } => format!("{self}\n\nRun \"{command} --help\" for usage"),
            KernelError::Command(error) => format!("{error:#}"),
            _ => self.to_string(),
        }
    }
}

/// A command descriptor failed registration-time validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid command \"{construct}\". Make sure it is exported as a command")]
    NotACommand { construct: String },

    #[error("Missing command name for \"{construct}\". Make sure to define it")]
    MissingName { construct: String },

    #[error("\"{command}\" {field} must be an array")]
    NotAList { command: String, field: &'static str },

    #[error("Required argument \"{required}\" cannot follow the optional argument \"{optional}\"")]
    OptionalBeforeRequired { optional: String, required: String },

    #[error("Spread argument \"{argument}\" must be at last position")]
    SpreadNotLast { argument: String },

    #[error("Malformed descriptor for \"{command}\": {message}")]
    Malformed { command: String, message: String },

    /// `owner` is `command "<name>"` or `global flags`.
    #[error("Flag \"{flag}\" is declared more than once in {owner}")]
    DuplicateFlag { owner: String, flag: String },

    #[error("Flags \"{flag}\" and \"{other}\" in {owner} both answer to \"{key}\"")]
    FlagConflict {
        owner: String,
        flag: String,
        other: String,
        key: String,
    },

    #[error(
        "Command \"{command}\" redeclares the global flag \"{flag}\" with a different type or alias"
    )]
    GlobalFlagMismatch { command: String, flag: String },
}
