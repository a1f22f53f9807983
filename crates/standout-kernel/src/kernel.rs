//! The kernel: command registry, dispatch and process lifecycle.
//!
//! A [`Kernel`] handles exactly one argument vector in its lifetime. Handling
//! moves it through three states:
//!
//! ```text
//! Idle ──handle()──▶ Running ──exit_process()──▶ Completed
//! ```
//!
//! # Dispatch
//!
//! [`Kernel::handle`] picks one of three branches from the shape of argv:
//!
//! 1. **Empty argv**: the default command runs (find and run hooks included,
//!    no parsing), then the kernel finalizes.
//! 2. **First token is a flag**: argv is parsed against the global flags only,
//!    every global flag present runs its handler, then the kernel finalizes.
//! 3. **First token is a command name**: the command is looked up by name or
//!    alias, global flag handlers run (they see the resolved command), the
//!    command's own arguments and flags are bound, and the command runs as the
//!    *entry command*.
//!
//! An unknown name in branch 3 still runs the global flag handlers, so flags
//! like `--help` work next to a typo, before failing with
//! [`KernelError::InvalidCommand`].
//!
//! # Finalization
//!
//! Every branch ends in [`Kernel::exit_process`], which runs the entry
//! command's `after:run` hooks, computes the exit code and calls the exit
//! handler once. The exception is a command declaring
//! [`stay_alive`](crate::CommandSettings::stay_alive): the kernel stays
//! `Running` after its body returns, and the command (or the embedder, via
//! [`Kernel::exit`]) ends the episode later.
//!
//! # Sub-commands
//!
//! [`Kernel::exec`] (usually reached through [`CommandContext::exec`]) runs a
//! registered command from inside another one. Sub-commands get their own run
//! hooks but never become the entry command, never run global flag handlers
//! and cannot end the process.
//!
//! # Example
//!
//! ```rust
//! use standout_kernel::{ArgSpec, CommandSpec, FnCommand, Kernel};
//!
//! let mut kernel = Kernel::builder()
//!     .command(FnCommand::new(
//!         CommandSpec::new("greet").arg(ArgSpec::string("name")),
//!         |ctx| {
//!             println!("Hello, {}", ctx.arg("name").and_then(|v| v.as_str()).unwrap_or(""));
//!             Ok(())
//!         },
//!     ))
//!     .on_exit(|_kernel| Ok(()))
//!     .build()?;
//!
//! kernel.handle(["greet", "virk"]);
//! assert_eq!(kernel.exit_code(), Some(0));
//! # Ok::<(), standout_kernel::ValidationError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::command::{
    ArgKind, ArgValue, Command, CommandContext, CommandId, CommandInstance, CommandSpec,
};
use crate::error::{KernelError, ValidationError};
use crate::flags::{FlagSpec, FlagValue};
use crate::hooks::{HookAction, HookError, HookPhase, Hooks};
use crate::list::ListCommand;
use crate::parser::{ParsedOptions, Parser};
use crate::suggest::{suggest, DEFAULT_SUGGESTION_DISTANCE};
use crate::validator::{validate, validate_against_globals, validate_flags};

/// Type alias for global flag handlers.
///
/// Receives the flag's value, the whole parsed bag and the resolved command
/// (`None` when no command was named or the name did not resolve).
pub type FlagHandlerFn =
    Rc<dyn Fn(&FlagValue, &ParsedOptions, Option<&CommandSpec>) -> anyhow::Result<()>>;

/// Type alias for the exit handler.
pub type ExitHandlerFn = Box<dyn FnMut(&Kernel) -> anyhow::Result<()>>;

/// Lifecycle state of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    Idle,
    Running,
    Completed,
}

/// A flag recognized regardless of the command, with its handler.
#[derive(Clone)]
pub struct GlobalFlag {
    pub spec: FlagSpec,
    handler: FlagHandlerFn,
}

impl fmt::Debug for GlobalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalFlag")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// A validated command and its descriptor.
#[derive(Clone)]
struct Registered {
    spec: Rc<CommandSpec>,
    command: Rc<dyn Command>,
}

impl Registered {
    fn new(command: Rc<dyn Command>) -> Self {
        Self {
            spec: Rc::new(command.spec()),
            command,
        }
    }

    fn validated(command: Rc<dyn Command>, globals: &[GlobalFlag]) -> Result<Self, ValidationError> {
        let registered = Self::new(command);
        validate(&registered.spec, registered.command.construct())?;
        validate_against_globals(&registered.spec, globals.iter().map(|flag| &flag.spec))?;
        Ok(registered)
    }
}

/// Prints the error, if any, and terminates the process with the exit code.
///
/// This is the exit handler a kernel starts with.
pub fn default_exit_handler(kernel: &Kernel) -> anyhow::Result<()> {
    if let Some(error) = kernel.error() {
        eprintln!("{}", error.render());
    }
    std::process::exit(kernel.exit_code().unwrap_or(0))
}

/// Command registry and dispatcher.
pub struct Kernel {
    commands: HashMap<String, Registered>,
    aliases: HashMap<String, String>,
    flags: Vec<GlobalFlag>,
    hooks: Hooks,
    default_command: Registered,
    exit_handler: Option<ExitHandlerFn>,
    suggestion_distance: usize,

    state: KernelState,
    error: Option<KernelError>,
    exit_code: Option<i32>,
    entry_id: Option<CommandId>,
    entry_command: Option<CommandInstance>,
    next_id: u64,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    /// Creates an idle kernel with no commands, the built-in
    /// [`ListCommand`] as default command and [`default_exit_handler`].
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
            flags: Vec::new(),
            hooks: Hooks::new(),
            default_command: Registered::new(Rc::new(ListCommand)),
            exit_handler: Some(Box::new(default_exit_handler)),
            suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
            state: KernelState::Idle,
            error: None,
            exit_code: None,
            entry_id: None,
            entry_command: None,
            next_id: 1,
        }
    }

    /// Creates a new builder.
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Validates and registers commands.
    ///
    /// Registration stops at the first invalid command; commands before it stay
    /// registered. A later command with the same name or alias replaces the
    /// earlier mapping. Commands are also checked against the global flags
    /// registered so far.
    pub fn register<I>(&mut self, commands: I) -> Result<&mut Self, ValidationError>
    where
        I: IntoIterator<Item = Rc<dyn Command>>,
    {
        for command in commands {
            let registered = Registered::validated(command, &self.flags)?;
            let name = registered.spec.name.clone();
            for alias in &registered.spec.aliases {
                self.aliases.insert(alias.clone(), name.clone());
            }
            debug!(command = %name, aliases = registered.spec.aliases.len(), "registered command");
            self.commands.insert(name, registered);
        }
        Ok(self)
    }

    /// Validates and registers a single command.
    pub fn command<C: Command + 'static>(
        &mut self,
        command: C,
    ) -> Result<&mut Self, ValidationError> {
        self.register([Rc::new(command) as Rc<dyn Command>])
    }

    /// Replaces the command run for an empty argv.
    pub fn set_default_command<C: Command + 'static>(
        &mut self,
        command: C,
    ) -> Result<&mut Self, ValidationError> {
        self.default_command = Registered::validated(Rc::new(command), &self.flags)?;
        Ok(self)
    }

    /// Registers a global flag. Handlers run in registration order.
    ///
    /// Fails if the flag's name or alias is already taken by another global
    /// flag, or clashes with a flag of a registered command.
    ///
    /// ```rust
    /// use standout_kernel::{FlagSpec, Kernel};
    ///
    /// let mut kernel = Kernel::new();
    /// kernel.flag(FlagSpec::new("help").alias('h'), |_value, _parsed, command| {
    ///     match command {
    ///         Some(spec) => println!("usage: {}", spec.name),
    ///         None => println!("usage: <command>"),
    ///     }
    ///     Ok(())
    /// })?;
    /// # Ok::<(), standout_kernel::ValidationError>(())
    /// ```
    pub fn flag<F>(&mut self, spec: FlagSpec, handler: F) -> Result<&mut Self, ValidationError>
    where
        F: Fn(&FlagValue, &ParsedOptions, Option<&CommandSpec>) -> anyhow::Result<()> + 'static,
    {
        self.add_flag(GlobalFlag {
            spec,
            handler: Rc::new(handler),
        })?;
        Ok(self)
    }

    fn add_flag(&mut self, flag: GlobalFlag) -> Result<(), ValidationError> {
        validate_flags("global flags", self.flags().chain([&flag.spec]))?;
        for registered in self.commands.values().chain([&self.default_command]) {
            validate_against_globals(&registered.spec, [&flag.spec])?;
        }
        debug!(flag = %flag.spec.name, "registered global flag");
        self.flags.push(flag);
        Ok(())
    }

    /// Adds a hook run before a command name is looked up.
    pub fn before_find<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).before_find(f);
        self
    }

    /// Adds a hook run after lookup, with the command found (if any).
    pub fn after_find<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).after_find(f);
        self
    }

    /// Adds a hook run before every command body, sub-commands included.
    pub fn before_run<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).before_run(f);
        self
    }

    /// Adds a hook run after a command body.
    ///
    /// For the entry command this happens when the kernel finalizes, so a
    /// stay-alive command sees it only once it exits.
    pub fn after_run<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).after_run(f);
        self
    }

    /// Replaces the exit handler.
    ///
    /// The handler is called once per kernel, after the exit code is known.
    /// An error it returns is logged and otherwise ignored.
    pub fn on_exit<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&Kernel) -> anyhow::Result<()> + 'static,
    {
        self.exit_handler = Some(Box::new(f));
        self
    }

    /// Sets the maximum edit distance for "did you mean" suggestions.
    pub fn set_suggestion_distance(&mut self, distance: usize) -> &mut Self {
        self.suggestion_distance = distance;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Where the kernel is in its single episode.
    pub fn state(&self) -> KernelState {
        self.state
    }

    /// The exit code, once the kernel has completed.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// The error the episode ended with, if any.
    pub fn error(&self) -> Option<&KernelError> {
        self.error.as_ref()
    }

    /// The entry command instance.
    ///
    /// `None` until the entry command's body has returned, and while it runs.
    /// An exit requested from the body through
    /// [`CommandContext::exit`](crate::CommandContext::exit) makes it visible to
    /// the `after:run` hooks and the exit handler.
    pub fn entry_command(&self) -> Option<&CommandInstance> {
        self.entry_command.as_ref()
    }

    /// Registered command descriptors, sorted by name.
    pub fn commands(&self) -> Vec<Rc<CommandSpec>> {
        let mut specs: Vec<_> = self.commands.values().map(|r| r.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// The command run for an empty argv.
    pub fn default_command(&self) -> &CommandSpec {
        &self.default_command.spec
    }

    /// Registered global flag descriptors, in registration order.
    pub fn flags(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.iter().map(|flag| &flag.spec)
    }

    /// The registered lifecycle hooks.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Command names and aliases within `max_distance` edits of `name`.
    pub fn get_suggestions(&self, name: &str, max_distance: usize) -> Vec<String> {
        let candidates = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str);
        suggest(name, candidates, max_distance)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolves the command named by the first token of `argv`.
    ///
    /// `before:find` and `after:find` hooks always run, with `None` when
    /// nothing matched.
    pub fn find<S: AsRef<str>>(&self, argv: &[S]) -> Result<Option<Rc<CommandSpec>>, KernelError> {
        let name = argv.first().map(AsRef::as_ref).unwrap_or_default();
        Ok(self.find_registered(name)?.map(|r| r.spec))
    }

    fn lookup(&self, name: &str) -> Option<&Registered> {
        self.commands.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|target| self.commands.get(target))
        })
    }

    fn find_registered(&self, name: &str) -> Result<Option<Registered>, KernelError> {
        let found = self.lookup(name).cloned();
        trace!(command = name, found = found.is_some(), "resolved command");
        self.run_find_hooks(found.as_ref().map(|r| r.spec.as_ref()))?;
        Ok(found)
    }

    fn run_find_hooks(&self, spec: Option<&CommandSpec>) -> Result<(), KernelError> {
        for phase in [HookPhase::Before, HookPhase::After] {
            self.hooks
                .execute_find(phase, spec)
                .map_err(|e| KernelError::hook(phase, HookAction::Find, e))?;
        }
        Ok(())
    }

    fn invalid_command(&self, name: &str) -> KernelError {
        KernelError::InvalidCommand {
            name: name.to_string(),
            suggestions: self.get_suggestions(name, self.suggestion_distance),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Handles an argument vector (program name excluded).
    ///
    /// Only the first call does anything; later calls are ignored. Errors do
    /// not escape: they end up in [`error`](Kernel::error) and the exit code.
    pub fn handle<I, S>(&mut self, argv: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.state != KernelState::Idle {
            debug!(state = ?self.state, "kernel already handled argv, ignoring");
            return;
        }
        self.state = KernelState::Running;
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

        let Some(first) = argv.first() else {
            debug!("no arguments, running default command");
            let result = self.exec_default();
            self.exit_process(result.err());
            return;
        };

        if first.starts_with('-') {
            debug!("no command named, running global flags");
            let result = self.exec_global_flags(&argv);
            self.exit_process(result.err());
            return;
        }

        match self.exec_main(first, &argv[1..]) {
            Err(error) => self.exit_process(Some(error)),
            Ok(()) if self.entry_stays_alive() && self.state == KernelState::Running => {
                debug!("entry command stays alive, deferring exit");
            }
            Ok(()) => self.exit_process(None),
        }
    }

    fn entry_stays_alive(&self) -> bool {
        self.entry_command
            .as_ref()
            .is_some_and(CommandInstance::stay_alive)
    }

    fn parser(&self) -> Parser<'_> {
        Parser::new(self.flags())
    }

    fn exec_default(&mut self) -> Result<(), KernelError> {
        let registered = self.default_command.clone();
        self.run_find_hooks(Some(registered.spec.as_ref()))?;
        let instance = self.instantiate(&registered.spec);
        self.run_entry(&registered, instance)
    }

    fn exec_global_flags(&mut self, argv: &[String]) -> Result<(), KernelError> {
        let parsed = self.parser().parse(argv, None)?;
        self.run_global_flags(&parsed, None)
    }

    fn exec_main(&mut self, name: &str, args: &[String]) -> Result<(), KernelError> {
        let Some(registered) = self.find_registered(name)? else {
            let parsed = self.parser().parse(args, None)?;
            self.run_global_flags(&parsed, None)?;
            return Err(self.invalid_command(name));
        };

        debug!(command = %registered.spec.name, "running entry command");
        let parsed = self.parser().parse(args, Some(registered.spec.as_ref()))?;
        self.run_global_flags(&parsed, Some(registered.spec.as_ref()))?;
        let instance = self.bind(&registered.spec, &parsed)?;
        self.run_entry(&registered, instance)
    }

    /// Runs a registered command as a sub-command of the running one.
    ///
    /// Lookup, find hooks, parsing and binding work as for the entry command.
    /// `after:run` hooks run even when the body fails; the body's error takes
    /// precedence over a hook error.
    pub fn exec<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Result<(), KernelError> {
        let Some(registered) = self.find_registered(name)? else {
            return Err(self.invalid_command(name));
        };

        trace!(command = %registered.spec.name, "running sub-command");
        let parsed = self.parser().parse(args, Some(registered.spec.as_ref()))?;
        let mut instance = self.bind(&registered.spec, &parsed)?;

        let outcome = self.run_instance(&registered, &mut instance);
        let after = self
            .hooks
            .execute_run(HookPhase::After, &instance)
            .map_err(|e| KernelError::hook(HookPhase::After, HookAction::Run, e));
        outcome.and(after)
    }

    fn run_global_flags(
        &self,
        parsed: &ParsedOptions,
        command: Option<&CommandSpec>,
    ) -> Result<(), KernelError> {
        for flag in &self.flags {
            let Some(value) = parsed.get(&flag.spec.name) else {
                continue;
            };
            trace!(flag = %flag.spec.name, "running global flag handler");
            (flag.handler)(value, parsed, command).map_err(|source| KernelError::GlobalFlag {
                flag: flag.spec.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn instantiate(&mut self, spec: &CommandSpec) -> CommandInstance {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        CommandInstance::new(id, spec)
    }

    fn bind(
        &mut self,
        spec: &CommandSpec,
        parsed: &ParsedOptions,
    ) -> Result<CommandInstance, KernelError> {
        let mut instance = self.instantiate(spec);
        let positional = parsed.positional();

        for (index, arg) in spec.args.iter().enumerate() {
            Parser::validate_arg(arg, index, parsed, &spec.name)?;
            match arg.kind {
                ArgKind::String => {
                    if let Some(value) = positional.get(index) {
                        instance.bind_arg(&arg.name, ArgValue::Single(value.clone()));
                    }
                }
                ArgKind::Spread => {
                    let rest = positional.get(index..).unwrap_or_default();
                    instance.bind_arg(&arg.name, ArgValue::Spread(rest.to_vec()));
                }
            }
        }

        for flag in &spec.flags {
            if let Some(value) = parsed.get(&flag.name) {
                instance.bind_flag(&flag.name, value.clone());
            }
        }

        Ok(instance)
    }

    fn run_entry(
        &mut self,
        registered: &Registered,
        mut instance: CommandInstance,
    ) -> Result<(), KernelError> {
        self.entry_id = Some(instance.id());
        let outcome = self.run_instance(registered, &mut instance);
        self.entry_command = Some(instance);
        outcome
    }

    fn run_instance(
        &mut self,
        registered: &Registered,
        instance: &mut CommandInstance,
    ) -> Result<(), KernelError> {
        self.hooks
            .execute_run(HookPhase::Before, instance)
            .map_err(|e| KernelError::hook(HookPhase::Before, HookAction::Run, e))?;

        let command = registered.command.clone();
        let mut ctx = CommandContext::new(self, instance);
        drive(command.as_ref(), &mut ctx).map_err(KernelError::from_command)
    }

    // =========================================================================
    // Exit
    // =========================================================================

    /// Ends the episode on behalf of the entry command.
    ///
    /// A no-op unless `id` is the entry command's, so sub-commands cannot end
    /// the process. This is how a stay-alive command finishes once control has
    /// returned from [`handle`](Kernel::handle).
    pub fn exit(&mut self, id: CommandId, error: Option<anyhow::Error>) {
        if self.entry_id != Some(id) {
            debug!(command = %id, "ignoring exit from non-entry command");
            return;
        }
        self.exit_process(error.map(KernelError::from_command));
    }

    pub(crate) fn exit_from(&mut self, command: &mut CommandInstance, error: Option<anyhow::Error>) {
        if self.entry_id != Some(command.id()) {
            debug!(command = %command.name(), "ignoring exit from sub-command");
            return;
        }
        let vacant = command.vacant();
        self.entry_command = Some(std::mem::replace(command, vacant));
        self.exit_process(error.map(KernelError::from_command));
        if let Some(instance) = self.entry_command.take() {
            *command = instance;
        }
    }

    /// Finalizes the episode: runs the entry command's `after:run` hooks,
    /// computes the exit code and calls the exit handler.
    ///
    /// Idempotent; once the kernel has completed further calls do nothing.
    pub fn exit_process(&mut self, error: Option<KernelError>) {
        let mut entry = self.entry_command.take();
        let finalized = self.finalize(entry.as_mut(), error);
        self.entry_command = entry;
        if finalized {
            self.call_exit_handler();
        }
    }

    fn finalize(
        &mut self,
        mut entry: Option<&mut CommandInstance>,
        error: Option<KernelError>,
    ) -> bool {
        if self.state == KernelState::Completed {
            trace!("kernel already completed");
            return false;
        }
        self.state = KernelState::Completed;

        let mut error = error.or_else(|| {
            entry
                .as_deref_mut()
                .and_then(CommandInstance::take_error)
                .map(KernelError::from_command)
        });

        if let Some(command) = entry.as_deref() {
            if let Err(e) = self.hooks.execute_run(HookPhase::After, command) {
                error = Some(KernelError::hook(HookPhase::After, HookAction::Run, e));
            }
        }

        let fallback = if error.is_some() { 1 } else { 0 };
        let exit_code = entry
            .as_deref()
            .and_then(CommandInstance::exit_code)
            .unwrap_or(fallback);

        debug!(exit_code, error = error.as_ref().map(KernelError::code), "kernel completed");
        self.exit_code = Some(exit_code);
        self.error = error;
        true
    }

    fn call_exit_handler(&mut self) {
        let Some(mut handler) = self.exit_handler.take() else {
            return;
        };
        if let Err(err) = handler(&*self) {
            warn!(error = %err, "exit handler failed");
        }
        self.exit_handler = Some(handler);
    }
}

fn drive(command: &dyn Command, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    command.prepare(ctx)?;
    command.run(ctx)?;
    command.completed(ctx)
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        f.debug_struct("Kernel")
            .field("state", &self.state)
            .field("commands", &names)
            .field("flags", &self.flags.len())
            .field("hooks", &self.hooks)
            .field("exit_code", &self.exit_code)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Kernel`].
///
/// Collects commands, flags, hooks and settings; [`build`](KernelBuilder::build)
/// validates every command and returns an idle kernel.
///
/// ```rust
/// use standout_kernel::{CommandSpec, FlagSpec, FnCommand, Kernel};
///
/// let kernel = Kernel::builder()
///     .command(FnCommand::new(CommandSpec::new("serve").stay_alive(true), |_ctx| Ok(())))
///     .flag(FlagSpec::new("verbose"), |_, _, _| Ok(()))
///     .suggestion_distance(2)
///     .build()?;
///
/// assert_eq!(kernel.commands().len(), 1);
/// # Ok::<(), standout_kernel::ValidationError>(())
/// ```
#[derive(Default)]
pub struct KernelBuilder {
    commands: Vec<Rc<dyn Command>>,
    default_command: Option<Rc<dyn Command>>,
    flags: Vec<GlobalFlag>,
    hooks: Hooks,
    exit_handler: Option<ExitHandlerFn>,
    suggestion_distance: Option<usize>,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command, validated on [`build`](KernelBuilder::build).
    pub fn command<C: Command + 'static>(mut self, command: C) -> Self {
        self.commands.push(Rc::new(command));
        self
    }

    pub fn commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = Rc<dyn Command>>,
    {
        self.commands.extend(commands);
        self
    }

    /// Replaces the built-in [`ListCommand`] default.
    pub fn default_command<C: Command + 'static>(mut self, command: C) -> Self {
        self.default_command = Some(Rc::new(command));
        self
    }

    /// Adds a global flag. Conflicts are reported by [`build`](KernelBuilder::build).
    pub fn flag<F>(mut self, spec: FlagSpec, handler: F) -> Self
    where
        F: Fn(&FlagValue, &ParsedOptions, Option<&CommandSpec>) -> anyhow::Result<()> + 'static,
    {
        self.flags.push(GlobalFlag {
            spec,
            handler: Rc::new(handler),
        });
        self
    }

    pub fn before_find<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.hooks = self.hooks.before_find(f);
        self
    }

    pub fn after_find<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&CommandSpec>) -> Result<(), HookError> + 'static,
    {
        self.hooks = self.hooks.after_find(f);
        self
    }

    pub fn before_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.hooks = self.hooks.before_run(f);
        self
    }

    pub fn after_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandInstance) -> Result<(), HookError> + 'static,
    {
        self.hooks = self.hooks.after_run(f);
        self
    }

    /// Appends a prepared set of hooks after the ones added so far.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks.extend(hooks);
        self
    }

    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Kernel) -> anyhow::Result<()> + 'static,
    {
        self.exit_handler = Some(Box::new(f));
        self
    }

    pub fn suggestion_distance(mut self, distance: usize) -> Self {
        self.suggestion_distance = Some(distance);
        self
    }

    /// Validates the global flags, then every command against them, and
    /// builds the kernel.
    pub fn build(self) -> Result<Kernel, ValidationError> {
        let mut kernel = Kernel::new();
        for flag in self.flags {
            kernel.add_flag(flag)?;
        }
        kernel.register(self.commands)?;
        if let Some(command) = self.default_command {
            kernel.default_command = Registered::validated(command, &kernel.flags)?;
        }
        kernel.hooks = self.hooks;
        if let Some(handler) = self.exit_handler {
            kernel.exit_handler = Some(handler);
        }
        if let Some(distance) = self.suggestion_distance {
            kernel.suggestion_distance = distance;
        }
        Ok(kernel)
    }
}
