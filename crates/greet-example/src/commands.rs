use anyhow::{bail, Result};
use standout_kernel::{
    ArgKind, ArgSpec, Command, CommandContext, CommandSpec, FlagSpec, FlagType, FnCommand,
};
use tracing::info;

pub struct Greet;

impl Command for Greet {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new("greet")
            .description("Greet someone")
            .arg(ArgSpec::string("name").description("Who to greet"))
            .flag(FlagSpec::new("shout").alias('s').description("Greet loudly"))
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let name = ctx.arg("name").and_then(|v| v.as_str()).unwrap_or_default();
        let greeting = format!("Hello, {name}!");
        if ctx.flag("shout").and_then(|v| v.as_bool()).unwrap_or(false) {
            println!("{}", greeting.to_uppercase());
        } else {
            println!("{greeting}");
        }
        Ok(())
    }
}

pub struct Install;

impl Command for Install {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new("install")
            .alias("i")
            .description("Install packages")
            .arg(ArgSpec::spread("packages").display_name("packages..."))
            .flag(FlagSpec::new("dry-run").alias('d').description("Only print the plan"))
            .flag(
                FlagSpec::new("retries")
                    .kind(FlagType::Number)
                    .default_value(3)
                    .description("Attempts per package"),
            )
    }

    fn prepare(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let retries = ctx.flag("retries").and_then(|v| v.as_number()).unwrap_or(0.0);
        if retries < 1.0 {
            bail!("--retries must be at least 1, got {retries}");
        }
        Ok(())
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let dry_run = ctx.flag("dry-run").and_then(|v| v.as_bool()).unwrap_or(false);
        let packages = ctx.arg("packages").and_then(|v| v.as_list()).unwrap_or_default();

        for package in packages {
            if dry_run {
                println!("would install {package}");
                continue;
            }
            info!(package = %package, "installing");
            println!("installed {package}");
        }
        Ok(())
    }

    fn completed(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let count = ctx.arg("packages").and_then(|v| v.as_list()).map_or(0, <[_]>::len);
        println!("{count} package(s) done");
        Ok(())
    }
}

/// The `serve` command, described by an embedded JSON manifest.
pub fn serve() -> Result<FnCommand<impl Fn(&mut CommandContext<'_>) -> Result<()>>> {
    let manifest = serde_json::from_str(include_str!("serve.json"))?;
    let spec = CommandSpec::from_manifest(&manifest)?;
    Ok(FnCommand::new(spec, |ctx| {
        let port = ctx.flag("port").and_then(|v| v.as_number()).unwrap_or(8080.0);
        println!("listening on :{port}");
        Ok(())
    }))
}

/// One-line usage for a command, e.g. `greet <name> [--shout|-s]`.
pub fn usage(spec: &CommandSpec) -> String {
    let mut line = spec.name.clone();
    for arg in &spec.args {
        let label = match arg.kind {
            ArgKind::String => arg.label().to_string(),
            ArgKind::Spread if arg.display_name.is_some() => arg.label().to_string(),
            ArgKind::Spread => format!("{}...", arg.label()),
        };
        if arg.required {
            line.push_str(&format!(" <{label}>"));
        } else {
            line.push_str(&format!(" [{label}]"));
        }
    }
    for flag in &spec.flags {
        match flag.alias {
            Some(alias) => line.push_str(&format!(" [--{}|-{alias}]", flag.name)),
            None => line.push_str(&format!(" [--{}]", flag.name)),
        }
    }
    line
}
