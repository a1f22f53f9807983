//! The built-in default command: lists registered commands.

use std::io::{self, Write};

use crate::command::{Command, CommandContext, CommandSpec};
use crate::kernel::Kernel;

/// Prints every registered command with its aliases and description.
///
/// A kernel runs this when argv is empty, unless another default command was
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCommand;

impl Command for ListCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new("list").description("List available commands")
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_listing(&mut out, ctx.kernel())?;
        Ok(())
    }

    fn construct(&self) -> &'static str {
        "ListCommand"
    }
}

/// Writes the command listing of `kernel` to `out`.
pub fn write_listing<W: Write>(out: &mut W, kernel: &Kernel) -> io::Result<()> {
    let commands = kernel.commands();
    if commands.is_empty() {
        return writeln!(out, "No commands registered");
    }

    let labels: Vec<String> = commands
        .iter()
        .map(|spec| match spec.aliases.as_slice() {
            [] => spec.name.clone(),
            aliases => format!("{} ({})", spec.name, aliases.join(", ")),
        })
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    writeln!(out, "Available commands:")?;
    for (label, spec) in labels.iter().zip(&commands) {
        if spec.description.is_empty() {
            writeln!(out, "  {label}")?;
        } else {
            writeln!(out, "  {label:<width$}  {}", spec.description)?;
        }
    }
    Ok(())
}
