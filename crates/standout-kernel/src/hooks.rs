//! Lifecycle hooks around command lookup and execution.
//!
//! Hooks let an application observe and veto the two lifecycle steps of every
//! invocation without touching command code. They fit into the dispatch flow
//! as follows:
//!
//! ```text
//! argv
//!   → BEFORE FIND ← (resolved command or None)
//!   → AFTER FIND  ← (resolved command or None)
//!   → global flags, argument binding
//!   → BEFORE RUN  ← (bound command instance)
//!   → command body
//!   → AFTER RUN   ← (bound command instance)
//! ```
//!
//! Find hooks run even when lookup fails, so an application can react to an
//! unknown command before the kernel reports it.
//!
//! Handlers registered for the same phase and action run in registration
//! order. The first handler returning an error stops the batch: the remaining
//! handlers of that batch are not invoked and the error is returned to the
//! kernel, which treats it as fatal for the current lifecycle step.

use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

use crate::command::{CommandInstance, CommandSpec};

/// Whether a hook runs before or after its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
        }
    }
}

/// The lifecycle step a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Command lookup by name or alias.
    Find,
    /// Command execution.
    Run,
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookAction::Find => write!(f, "find"),
            HookAction::Run => write!(f, "run"),
        }
    }
}

/// Error returned by a hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    /// Creates a new hook error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Type alias for find hook functions.
///
/// Receives the resolved descriptor, or `None` when lookup failed.
pub type FindHookFn = Rc<dyn Fn(Option<&CommandSpec>) -> Result<(), HookError>>;

/// Type alias for run hook functions.
pub type RunHookFn = Rc<dyn Fn(&CommandInstance) -> Result<(), HookError>>;

/// Ordered hook registry, one list per phase and action.
#[derive(Clone, Default)]
pub struct Hooks {
    before_find: Vec<FindHookFn>,
    after_find: Vec<FindHookFn>,
    before_run: Vec<RunHookFn>,
    after_run: Vec<RunHookFn>,
}

impl Hooks {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.before_find.is_empty()
            && self.after_find.is_empty()
            && self.before_run.is_empty()
            && self.after_run.is_empty()
    }

    /// Returns the number of handlers registered for a phase and action.
    pub fn len(&self, phase: HookPhase, action: HookAction) -> usize {
        match (phase, action) {
            (HookPhase::Before, HookAction::Find) => self.before_find.len(),
            (HookPhase::After, HookAction::Find) => self.after_find.len(),
            (HookPhase::Before, HookAction::Run) => self.before_run.len(),
            (HookPhase::After, HookAction::Run) => self.after_run.len(),
        }
    }

    /// Adds a hook that runs before command lookup.
    ///
    /// # Example
    ///
    /// ```rust
    /// use standout_kernel::{HookError, Hooks};
    ///
    /// let hooks = Hooks::new()
    ///     .before_find(|_| Ok(()))
    ///     .after_find(|command| match command {
    ///         Some(_) => Ok(()),
    ///         None => Err(HookError::new("lookup failed")),
    ///     });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn before_find<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.before_find.push(Rc::new(f));
        self
    }

    /// Adds a hook that runs after command lookup, with its result.
    pub fn after_find<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.after_find.push(Rc::new(f));
        self
    }

    /// Adds a hook that runs before a command body, with the bound instance.
    pub fn before_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.before_run.push(Rc::new(f));
        self
    }

    /// Adds a hook that runs after a command body, even a failed one.
    pub fn after_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.after_run.push(Rc::new(f));
        self
    }

    /// Appends every hook of `other` after the ones already registered.
    pub fn extend(&mut self, other: Hooks) {
        self.before_find.extend(other.before_find);
        self.after_find.extend(other.after_find);
        self.before_run.extend(other.before_run);
        self.after_run.extend(other.after_run);
    }

    /// Runs the find hooks of a phase in order, stopping at the first error.
    pub fn execute_find(
        &self,
        phase: HookPhase,
        command: Option<&CommandSpec>,
    ) -> Result<(), HookError> {
        let hooks = match phase {
            HookPhase::Before => &self.before_find,
            HookPhase::After => &self.after_find,
        };
        trace!(%phase, count = hooks.len(), "running find hooks");
        for hook in hooks {
            hook(command)?;
        }
        Ok(())
    }

    /// Runs the run hooks of a phase in order, stopping at the first error.
    pub fn execute_run(&self, phase: HookPhase, command: &CommandInstance) -> Result<(), HookError> {
        let hooks = match phase {
            HookPhase::Before => &self.before_run,
            HookPhase::After => &self.after_run,
        };
        trace!(%phase, command = command.name(), count = hooks.len(), "running run hooks");
        for hook in hooks {
            hook(command)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_find_count", &self.before_find.len())
            .field("after_find_count", &self.after_find.len())
            .field("before_run_count", &self.before_run.len())
            .field("after_run_count", &self.after_run.len())
            .finish()
    }
}
