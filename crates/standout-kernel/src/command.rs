//! Commands, their descriptors and their running instances.
//!
//! A command has two halves:
//!
//! - A static [`CommandSpec`]: name, aliases, positional arguments, flags and
//!   settings. The kernel validates it once at registration and never mutates
//!   it afterwards.
//! - A body: the [`Command`] trait, whose [`run`](Command::run) receives a
//!   [`CommandContext`] for one invocation.
//!
//! Each invocation gets a fresh [`CommandInstance`] holding the argument and
//! flag values bound from argv, plus an optional error and exit code the body
//! may set. The instance of the top-level command (the *entry command*) decides
//! the process exit code.
//!
//! # Example
//!
//! ```rust
//! use standout_kernel::{ArgSpec, Command, CommandContext, CommandSpec, FlagSpec};
//!
//! struct Greet;
//!
//! impl Command for Greet {
//!     fn spec(&self) -> CommandSpec {
//!         CommandSpec::new("greet")
//!             .description("Greet someone")
//!             .arg(ArgSpec::string("name"))
//!             .flag(FlagSpec::new("shout"))
//!     }
//!
//!     fn run(&self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
//!         let name = ctx.arg("name").and_then(|v| v.as_str()).unwrap_or("world");
//!         println!("Hello, {name}");
//!         Ok(())
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::KernelError;
use crate::flags::{FlagSpec, FlagValue};
use crate::kernel::Kernel;

/// Kind of a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgKind {
    /// A single value.
    #[default]
    String,
    /// Every remaining positional value. Must be declared last.
    Spread,
}

fn required_by_default() -> bool {
    true
}

/// Descriptor for a positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ArgKind,
    #[serde(default = "required_by_default")]
    pub required: bool,
    /// Name shown in usage output. Defaults to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl ArgSpec {
    /// A required single-value argument.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::String,
            required: true,
            display_name: None,
            description: String::new(),
        }
    }

    /// A required spread argument collecting the remaining positionals.
    pub fn spread(name: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::Spread,
            ..Self::string(name)
        }
    }

    /// Marks the argument optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name used in usage output.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Per-command settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSettings {
    /// When true, finishing [`Command::run`] does not end the episode. The
    /// command must call [`CommandContext::exit`] (or the embedder
    /// [`Kernel::exit`]) later.
    #[serde(default)]
    pub stay_alive: bool,
}

/// Static descriptor of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    #[serde(rename = "commandName", default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub flags: Vec<FlagSpec>,
    #[serde(default)]
    pub settings: CommandSettings,
    #[serde(default)]
    pub description: String,
    /// Where the descriptor came from (file or module path). Only used to
    /// make validation messages point somewhere useful.
    #[serde(rename = "commandPath", default)]
    pub source: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            args: Vec::new(),
            flags: Vec::new(),
            settings: CommandSettings::default(),
            description: String::new(),
            source: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn stay_alive(mut self, stay_alive: bool) -> Self {
        self.settings.stay_alive = stay_alive;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Parses and validates a JSON command manifest entry.
    ///
    /// See [`validate_manifest`](crate::validate_manifest) for the checks.
    pub fn from_manifest(
        value: &serde_json::Value,
    ) -> Result<Self, crate::error::ValidationError> {
        crate::validator::validate_manifest(value)
    }
}

/// A command body.
///
/// Commands take `&self` so the same command can be re-entered through
/// [`CommandContext::exec`]. Use interior mutability for state.
pub trait Command {
    /// The command's static descriptor. Called once, at registration.
    fn spec(&self) -> CommandSpec;

    /// Runs after `before:run` hooks and before [`run`](Command::run).
    fn prepare(&self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The command body.
    fn run(&self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()>;

    /// Runs after a successful [`run`](Command::run).
    fn completed(&self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name of the implementing type, used in validation messages.
    fn construct(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A command built from a descriptor and a closure.
///
/// ```rust
/// use standout_kernel::{CommandSpec, FnCommand};
///
/// let hello = FnCommand::new(CommandSpec::new("hello"), |_ctx| {
///     println!("hello");
///     Ok(())
/// });
/// ```
pub struct FnCommand<F> {
    spec: CommandSpec,
    f: F,
}

impl<F> FnCommand<F> {
    pub fn new(spec: CommandSpec, f: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>) -> anyhow::Result<()>,
    {
        Self { spec, f }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&mut CommandContext<'_>) -> anyhow::Result<()>,
{
    fn spec(&self) -> CommandSpec {
        self.spec.clone()
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        (self.f)(ctx)
    }

    fn construct(&self) -> &'static str {
        "FnCommand"
    }
}

/// Identifies one command invocation within a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A bound positional argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Single(String),
    Spread(Vec<String>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Single(s) => Some(s),
            ArgValue::Spread(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::Spread(values) => Some(values),
            ArgValue::Single(_) => None,
        }
    }
}

/// One invocation of a command, with values bound from argv.
#[derive(Debug)]
pub struct CommandInstance {
    id: CommandId,
    name: String,
    args: HashMap<String, ArgValue>,
    flags: HashMap<String, FlagValue>,
    stay_alive: bool,
    error: Option<anyhow::Error>,
    exit_code: Option<i32>,
}

impl CommandInstance {
    pub(crate) fn new(id: CommandId, spec: &CommandSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            args: HashMap::new(),
            flags: HashMap::new(),
            stay_alive: spec.settings.stay_alive,
            error: None,
            exit_code: None,
        }
    }

    /// An unbound instance with the same identity, left behind while the real
    /// one is lent out.
    pub(crate) fn vacant(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            args: HashMap::new(),
            flags: HashMap::new(),
            stay_alive: self.stay_alive,
            error: None,
            exit_code: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(name: &str) -> Self {
        Self::new(CommandId(0), &CommandSpec::new(name))
    }

    pub(crate) fn bind_arg(&mut self, name: &str, value: ArgValue) {
        self.args.insert(name.to_string(), value);
    }

    pub(crate) fn bind_flag(&mut self, name: &str, value: FlagValue) {
        self.flags.insert(name.to_string(), value);
    }

    pub(crate) fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a bound argument, `None` when an optional argument was omitted.
    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.args.get(name)
    }

    pub fn args(&self) -> &HashMap<String, ArgValue> {
        &self.args
    }

    /// Returns a bound flag, `None` when the flag was absent and has no default.
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn flags(&self) -> &HashMap<String, FlagValue> {
        &self.flags
    }

    pub fn stay_alive(&self) -> bool {
        self.stay_alive
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    /// Records an error without failing the body. The kernel adopts it when
    /// this is the entry command and no other error was raised.
    pub fn set_error(&mut self, error: anyhow::Error) {
        self.error = Some(error);
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Overrides the process exit code chosen by the kernel.
    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

/// What a command body sees: its own instance and the kernel it runs in.
pub struct CommandContext<'a> {
    kernel: &'a mut Kernel,
    command: &'a mut CommandInstance,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(kernel: &'a mut Kernel, command: &'a mut CommandInstance) -> Self {
        Self { kernel, command }
    }

    pub fn kernel(&self) -> &Kernel {
        &*self.kernel
    }

    pub fn command(&self) -> &CommandInstance {
        &*self.command
    }

    pub fn command_mut(&mut self) -> &mut CommandInstance {
        &mut *self.command
    }

    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.command.arg(name)
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.command.flag(name)
    }

    /// Runs another registered command as a sub-command.
    ///
    /// See [`Kernel::exec`].
    pub fn exec<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Result<(), KernelError> {
        self.kernel.exec(name, args)
    }

    /// Ends the episode, if this is the entry command.
    ///
    /// Sub-commands cannot end the process; for them this is a no-op.
    pub fn exit(&mut self, error: Option<anyhow::Error>) {
        self.kernel.exit_from(self.command, error);
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
