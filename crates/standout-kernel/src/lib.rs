//! Command dispatch kernel for CLI applications.
//!
//! `standout-kernel` takes a raw argument vector and turns it into exactly one
//! command execution with a well defined process exit. It owns command
//! registration and validation, argv parsing and type casting, lifecycle hooks
//! and the exit protocol. Rendering, help screens and prompts are left to the
//! application.
//!
//! # Features
//!
//! - **Command registry**: commands by name and alias, validated once at
//!   registration ([`validate`], [`validate_manifest`]), with flag names and
//!   aliases checked for clashes ([`validate_flags`], [`validate_against_globals`])
//! - **Typed flags**: boolean, string, number and list flags cast from raw
//!   argv ([`cast`]), with global flags that work next to any command
//! - **Hooks**: `before`/`after` hooks around command lookup and execution
//!   ([`Hooks`])
//! - **Exit protocol**: a single exit per kernel, long-running commands that
//!   keep the process alive, exit codes chosen by the entry command
//! - **Suggestions**: "did you mean" candidates for unknown commands
//!   ([`suggest`])
//!
//! # Lifecycle
//!
//! ```text
//! Kernel::handle(argv)
//!   → find command ────── before:find / after:find hooks
//!   → global flag handlers
//!   → bind arguments and flags
//!   → run ─────────────── before:run / after:run hooks
//!   → exit_process ────── exit handler
//! ```
//!
//! See [`Kernel`] for the dispatch branches and the exit rules.
//!
//! # Example
//!
//! ```rust
//! use standout_kernel::{ArgSpec, CommandSpec, FlagSpec, FlagType, FnCommand, Kernel};
//!
//! let mut kernel = Kernel::builder()
//!     .command(FnCommand::new(
//!         CommandSpec::new("install")
//!             .alias("i")
//!             .arg(ArgSpec::spread("packages"))
//!             .flag(FlagSpec::new("retries").kind(FlagType::Number).default_value(3)),
//!         |ctx| {
//!             let packages = ctx.arg("packages").and_then(|v| v.as_list()).unwrap_or_default();
//!             let retries = ctx.flag("retries").and_then(|v| v.as_number()).unwrap_or(0.0);
//!             println!("installing {} packages ({retries} retries)", packages.len());
//!             Ok(())
//!         },
//!     ))
//!     .on_exit(|_kernel| Ok(()))
//!     .build()?;
//!
//! kernel.handle(["i", "lodash", "react", "--retries=5"]);
//! assert_eq!(kernel.exit_code(), Some(0));
//! # Ok::<(), standout_kernel::ValidationError>(())
//! ```

mod command;
mod error;
mod flags;
mod hooks;
mod kernel;
mod list;
mod parser;
mod suggest;
mod validator;

pub use command::{
    ArgKind, ArgSpec, ArgValue, Command, CommandContext, CommandId, CommandInstance,
    CommandSettings, CommandSpec, FnCommand,
};

pub use error::{KernelError, ValidationError};

pub use flags::{cast, FlagSpec, FlagType, FlagValue, RawValue};

pub use hooks::{FindHookFn, HookAction, HookError, HookPhase, Hooks, RunHookFn};

pub use kernel::{
    default_exit_handler, ExitHandlerFn, FlagHandlerFn, GlobalFlag, Kernel, KernelBuilder,
    KernelState,
};

pub use list::{write_listing, ListCommand};

pub use parser::{ParsedOptions, Parser, POSITIONAL_KEY};

pub use suggest::{suggest, DEFAULT_SUGGESTION_DISTANCE};

pub use validator::{validate, validate_against_globals, validate_flags, validate_manifest};
