//! Example CLI built on standout-kernel.
//!
//! ```bash
//! cargo run -p greet-example -- greet virk --shout
//! cargo run -p greet-example -- i lodash react --dry-run
//! RUST_LOG=standout_kernel=debug cargo run -p greet-example -- serve -p 9000
//! ```

mod commands;

use std::time::Duration;

use anyhow::Result;
use standout_kernel::{write_listing, CommandSpec, FlagSpec, Kernel, KernelState};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{serve, usage, Greet, Install};

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let mut kernel = Kernel::builder()
        .command(Greet)
        .command(Install)
        .command(serve()?)
        .after_run(|command| {
            debug!(command = command.name(), exit_code = ?command.exit_code(), "command finished");
            Ok(())
        })
        .build()?;

    let mut listing = Vec::new();
    write_listing(&mut listing, &kernel)?;
    let listing = String::from_utf8_lossy(&listing).into_owned();

    kernel.flag(
        FlagSpec::new("help").alias('h').description("Show usage"),
        move |_, _, command| {
            match command {
                Some(spec) => print!("{}", command_help(spec)),
                None => print!("Usage: greet <command> [options]\n\n{listing}"),
            }
            std::process::exit(0)
        },
    )?;

    kernel.handle(std::env::args().skip(1));

    // Only reached when the entry command stays alive
    if kernel.state() == KernelState::Running {
        if let Some(id) = kernel.entry_command().map(|command| command.id()) {
            std::thread::sleep(Duration::from_millis(500));
            info!("shutting down");
            kernel.exit(id, None);
        }
    }
    Ok(())
}

fn command_help(spec: &CommandSpec) -> String {
    let mut out = format!("Usage: {}\n", usage(spec));
    if !spec.description.is_empty() {
        out.push_str(&format!("\n{}\n", spec.description));
    }
    if !spec.args.is_empty() {
        out.push_str("\nArguments:\n");
        for arg in &spec.args {
            out.push_str(&format!("  {:<14}{}\n", arg.label(), arg.description));
        }
    }
    if !spec.flags.is_empty() {
        out.push_str("\nFlags:\n");
        for flag in &spec.flags {
            out.push_str(&format!("  --{:<12}{}\n", flag.name, flag.description));
        }
    }
    out
}
