//! Argv parsing.
//!
//! The parser turns an argument vector into [`ParsedOptions`]: the ordered
//! positional values plus every known flag cast to its declared type.
//!
//! Splitting argv into flags and positionals is GNU style and delegated to a
//! `clap::Command` built at parse time from the flag descriptors in play (the
//! global flags, plus the resolved command's flags when there is one):
//!
//! | Input | Result |
//! |-------|--------|
//! | `--verbose` | boolean `true` |
//! | `--verbose=false` | boolean `false` |
//! | `--name virk`, `--name=virk`, `-n virk` | `"virk"` |
//! | `--files a.js --files b.js` | `["a.js", "b.js"]` |
//! | `-- --not-a-flag` | positional `"--not-a-flag"` |
//!
//! Booleans never consume the following token, so `greet --shout virk` binds
//! `virk` as a positional.
//!
//! A command flag shadows a global flag of the same name. Registration
//! rejects clashing names and aliases, but the parser still never hands one
//! short alias to two flags: the first claim wins and later ones are dropped.
//!
//! Parsing is all-or-nothing: an unknown flag is reported before any value is
//! cast, and a value that fails to cast aborts the parse. Nothing is handed to
//! flag handlers until the whole bag is valid.

use std::collections::{HashMap, HashSet};

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches};
use tracing::trace;

use crate::command::{ArgSpec, CommandSpec};
use crate::error::KernelError;
use crate::flags::{cast, FlagSpec, FlagType, FlagValue, RawValue};

/// Key under which positional values are collected.
pub const POSITIONAL_KEY: &str = "_";

/// Values parsed from argv.
///
/// Flag values are reachable both by name and by alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOptions {
    positional: Vec<String>,
    values: HashMap<String, FlagValue>,
}

impl ParsedOptions {
    /// Positional values in argv order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Looks up a flag value by name or alias.
    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys, aliases included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.positional.is_empty()
    }

    fn insert(&mut self, flag: &KnownFlag<'_>, value: FlagValue) {
        if let Some(short) = flag.short {
            self.values.insert(short.to_string(), value.clone());
        }
        self.values.insert(flag.spec.name.clone(), value);
    }
}

/// A flag in play for one parse, with the short alias it actually gets.
struct KnownFlag<'a> {
    spec: &'a FlagSpec,
    short: Option<char>,
}

/// Parses argv against a set of global flags.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    global_flags: Vec<&'a FlagSpec>,
}

impl<'a> Parser<'a> {
    pub fn new(global_flags: impl IntoIterator<Item = &'a FlagSpec>) -> Self {
        Self {
            global_flags: global_flags.into_iter().collect(),
        }
    }

    /// Parses argv.
    ///
    /// With `command`, the command's flags are accepted alongside the global
    /// ones and cast failures name the command.
    ///
    /// # Errors
    ///
    /// - [`KernelError::UnknownFlag`] for a flag that is neither global nor the
    ///   command's.
    /// - [`KernelError::InvalidFlag`] for a value that does not cast.
    /// - [`KernelError::InvalidArgv`] for anything else argv splitting rejects.
    pub fn parse<S: AsRef<str>>(
        &self,
        argv: &[S],
        command: Option<&CommandSpec>,
    ) -> Result<ParsedOptions, KernelError> {
        let flags = self.known_flags(command);
        let matches = split(&flags, argv)?;

        let mut parsed = ParsedOptions {
            positional: matches
                .get_many::<String>(POSITIONAL_KEY)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            values: HashMap::new(),
        };

        for known in &flags {
            let flag = known.spec;
            let raw = match matches.get_many::<String>(&flag.name) {
                Some(values) => raw_value(flag.kind, values.map(String::as_str).collect()),
                None => match &flag.default {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };

            let value = cast(flag.kind, &raw).ok_or_else(|| KernelError::InvalidFlag {
                flag: flag.name.clone(),
                expected: flag.kind,
                command: command
                    .filter(|spec| spec.flags.iter().any(|f| f.name == flag.name))
                    .map(|spec| spec.name.clone()),
            })?;
            parsed.insert(known, value);
        }

        trace!(
            positional = parsed.positional.len(),
            flags = parsed.len(),
            "parsed argv"
        );
        Ok(parsed)
    }

    /// Checks that a required positional argument is present.
    ///
    /// `index` is the argument's position in the command's argument list,
    /// which is also its position among the positional values.
    pub fn validate_arg(
        arg: &ArgSpec,
        index: usize,
        parsed: &ParsedOptions,
        command: &str,
    ) -> Result<(), KernelError> {
        if arg.required && parsed.positional.get(index).is_none() {
            return Err(KernelError::MissingArgument {
                argument: arg.name.clone(),
                command: command.to_string(),
            });
        }
        Ok(())
    }

    /// The command's flags followed by the global ones.
    ///
    /// The first definition of a name wins, so a command flag shadows a global
    /// flag of the same name. A short alias is dropped when an earlier flag
    /// already claimed it or when it equals another flag's name.
    fn known_flags<'b>(&'b self, command: Option<&'b CommandSpec>) -> Vec<KnownFlag<'b>> {
        let mut seen = HashSet::new();
        let specs: Vec<&FlagSpec> = command
            .into_iter()
            .flat_map(|spec| spec.flags.iter())
            .chain(self.global_flags.iter().map(|flag| &**flag))
            .filter(|flag| seen.insert(flag.name.clone()))
            .collect();

        let mut claimed = seen;
        specs
            .into_iter()
            .map(|spec| {
                let short = spec.alias.filter(|alias| claimed.insert(alias.to_string()));
                if spec.alias.is_some() && short.is_none() {
                    trace!(flag = %spec.name, "short alias already claimed, dropped");
                }
                KnownFlag { spec, short }
            })
            .collect()
    }
}

fn split<S: AsRef<str>>(flags: &[KnownFlag<'_>], argv: &[S]) -> Result<ArgMatches, KernelError> {
    let mut cmd = clap::Command::new("standout-kernel")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new(POSITIONAL_KEY)
                .num_args(1..)
                .action(ArgAction::Append)
                .allow_negative_numbers(true),
        );
    for flag in flags {
        cmd = cmd.arg(flag_arg(flag));
    }

    cmd.try_get_matches_from(argv.iter().map(|arg| arg.as_ref()))
        .map_err(|err| match err.kind() {
            ErrorKind::UnknownArgument => KernelError::UnknownFlag {
                flag: offending_flag(&err).unwrap_or_default(),
            },
            _ => KernelError::InvalidArgv {
                message: first_line(&err),
            },
        })
}

fn flag_arg(known: &KnownFlag<'_>) -> Arg {
    let flag = known.spec;
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .action(ArgAction::Append)
        .num_args(0..=1);
    if let Some(short) = known.short {
        arg = arg.short(short);
    }
    match flag.kind {
        // `--flag=value` only, so a boolean never swallows the next token
        FlagType::Boolean => arg.require_equals(true).default_missing_value("true"),
        _ => arg.default_missing_value(""),
    }
}

fn raw_value(kind: FlagType, occurrences: Vec<&str>) -> RawValue {
    if kind.is_list() {
        return RawValue::String(occurrences.join(","));
    }
    let last = occurrences.last().copied().unwrap_or_default();
    match (kind, last) {
        (FlagType::Boolean, "true") => RawValue::Bool(true),
        (FlagType::Boolean, "false") => RawValue::Bool(false),
        _ => RawValue::String(last.to_string()),
    }
}

fn offending_flag(err: &clap::Error) -> Option<String> {
    match err.get(ContextKind::InvalidArg)? {
        ContextValue::String(arg) => {
            let arg = arg.trim_start_matches('-');
            Some(arg.split('=').next().unwrap_or(arg).to_string())
        }
        _ => None,
    }
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}
